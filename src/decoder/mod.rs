//! 解码适配层：把"帧或图片 -> 文本或空"的能力抽象为 trait，
//! 摄像头循环与单张图片识别都只依赖这里的接口

use std::path::Path;

use image::GrayImage;
use thiserror::Error;

pub mod rxing_decoder;

pub use rxing_decoder::RxingDecoder;

/// 识别器报告的定位点（像素坐标）
///
/// 对 QR 码来说是三个定位图案的中心（高版本还有校正图案中心），
/// 不是码图的外边角。
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerPoint {
    pub x: f32,
    pub y: f32,
}

/// 结构化识别结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScanResult {
    pub text: String,
    /// 识别器给出的定位点，按识别器顺序排列；未要求详细结果时为空
    pub corners: Vec<CornerPoint>,
}

impl ScanResult {
    pub fn text_only(text: impl Into<String>) -> Self {
        Self { text: text.into(), corners: Vec::new() }
    }

    /// 定位点的外接矩形 (x, y, 宽, 高)
    ///
    /// 矩形经过定位图案中心，因此每条边都比码图外缘向内缩进约 3.5 个模块。
    pub fn bounding_box(&self) -> Option<(f32, f32, f32, f32)> {
        let first = self.corners.first()?;
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
        for p in &self.corners[1..] {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        Some((min_x, min_y, max_x - min_x, max_y - min_y))
    }
}

/// 识别器内部失败（区别于"没有二维码"）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("二维码数据损坏: {0}")]
    Corrupt(String),
}

/// 单张图片识别的失败类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ImageDecodeError {
    #[error("图片中没有可识别的二维码")]
    NoCodeFound,
    #[error("图片无法读取: {0}")]
    Unreadable(String),
    #[error("识别失败: {0}")]
    Decode(#[from] DecodeError),
}

/// 解码能力：找到二维码返回 Some，没有则返回 None
pub trait QrDecoder: Send + Sync {
    fn decode(&self, frame: &GrayImage) -> Result<Option<ScanResult>, DecodeError>;
}

/// 一次性识别一张静态图片
pub fn decode_image_file(
    decoder: &dyn QrDecoder,
    path: &Path,
    detailed_result: bool,
) -> Result<ScanResult, ImageDecodeError> {
    let img = image::open(path).map_err(|e| ImageDecodeError::Unreadable(e.to_string()))?;
    let luma = img.to_luma8();

    match decoder.decode(&luma)? {
        Some(result) if !result.text.is_empty() => {
            if detailed_result {
                Ok(result)
            } else {
                Ok(ScanResult::text_only(result.text))
            }
        }
        _ => Err(ImageDecodeError::NoCodeFound),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use image::{GrayImage, Luma};
    use qrcode::{Color, QrCode};

    /// 生成带4模块静区、每模块 scale 像素的二维码灰度图
    pub fn render_qr(data: &str, scale: u32) -> GrayImage {
        let code = QrCode::new(data.as_bytes()).expect("生成二维码失败");
        let modules = code.width() as u32;
        let colors = code.to_colors();
        let quiet = 4;
        let side = (modules + quiet * 2) * scale;
        let mut img = GrayImage::from_pixel(side, side, Luma([255u8]));
        for y in 0..modules {
            for x in 0..modules {
                let idx = (y * modules + x) as usize;
                if matches!(colors.get(idx), Some(Color::Dark)) {
                    for dy in 0..scale {
                        for dx in 0..scale {
                            img.put_pixel((x + quiet) * scale + dx, (y + quiet) * scale + dy, Luma([0u8]));
                        }
                    }
                }
            }
        }
        img
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::test_support::render_qr;
    use image::{GrayImage, Luma};
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// 总是返回固定结果的识别器
    struct FixedDecoder(Option<ScanResult>);

    impl QrDecoder for FixedDecoder {
        fn decode(&self, _frame: &GrayImage) -> Result<Option<ScanResult>, DecodeError> {
            Ok(self.0.clone())
        }
    }

    fn save_png(img: &GrayImage) -> NamedTempFile {
        let file = tempfile::Builder::new().suffix(".png").tempfile().expect("创建临时文件失败");
        img.save(file.path()).expect("写入PNG失败");
        file
    }

    #[test]
    fn test_bounding_box() {
        let result = ScanResult {
            text: "x".into(),
            corners: vec![
                CornerPoint { x: 10.0, y: 40.0 },
                CornerPoint { x: 10.0, y: 10.0 },
                CornerPoint { x: 50.0, y: 10.0 },
            ],
        };
        assert_eq!(result.bounding_box(), Some((10.0, 10.0, 40.0, 30.0)));
        assert_eq!(ScanResult::text_only("x").bounding_box(), None, "没有定位点时没有外接矩形");
    }

    #[test]
    fn test_decode_real_qr_image() {
        let file = save_png(&render_qr("https://example.com", 8));
        let decoder = RxingDecoder::default();

        let result = decode_image_file(&decoder, file.path(), true).expect("应该识别成功");
        assert_eq!(result.text, "https://example.com");
        assert!(!result.corners.is_empty(), "详细结果应该包含定位点");

        let plain = decode_image_file(&decoder, file.path(), false).expect("应该识别成功");
        assert!(plain.corners.is_empty(), "非详细模式不返回定位点");
    }

    #[test]
    fn test_bounding_box_follows_finder_centres() {
        // 21 模块的版本1码，4 模块静区，每模块 6 像素
        let scale = 6.0;
        let img = render_qr("hello", 6);
        let result = RxingDecoder.decode(&img).expect("识别不应报错").expect("应该找到二维码");
        let (x, y, w, h) = result.bounding_box().expect("应该有外接矩形");

        let inner_edge = (4.0 + 3.5) * scale;
        let span = (21.0 - 7.0) * scale;
        assert!((x - inner_edge).abs() <= scale / 2.0, "左边应位于定位图案中心: {}", x);
        assert!((y - inner_edge).abs() <= scale / 2.0, "上边应位于定位图案中心: {}", y);
        assert!((w - span).abs() <= scale, "宽度应为两个中心间距: {}", w);
        assert!((h - span).abs() <= scale, "高度应为两个中心间距: {}", h);
    }

    #[test]
    fn test_blank_image_has_no_code() {
        let file = save_png(&GrayImage::from_pixel(200, 200, Luma([255u8])));
        let result = decode_image_file(&RxingDecoder::default(), file.path(), true);
        assert_eq!(result, Err(ImageDecodeError::NoCodeFound));
    }

    #[test]
    fn test_corrupt_file_is_unreadable() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().expect("创建临时文件失败");
        file.write_all(b"definitely not a png").expect("写入失败");

        let result = decode_image_file(&FixedDecoder(None), file.path(), true);
        assert!(matches!(result, Err(ImageDecodeError::Unreadable(_))), "损坏的文件应该无法读取");
    }

    #[test]
    fn test_empty_text_counts_as_no_code() {
        let file = save_png(&GrayImage::from_pixel(20, 20, Luma([0u8])));
        let decoder = FixedDecoder(Some(ScanResult::text_only("")));
        assert_eq!(decode_image_file(&decoder, file.path(), true), Err(ImageDecodeError::NoCodeFound));
    }
}
