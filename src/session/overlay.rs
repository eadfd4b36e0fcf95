//! 预览叠加层：在画面上框出识别到的二维码

use image::{buffer::ConvertBuffer, Rgba, RgbImage, RgbaImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;

use crate::decoder::ScanResult;

pub const REGION_COLOR: Rgba<u8> = Rgba([255, 193, 7, 255]);
pub const OUTLINE_COLOR: Rgba<u8> = Rgba([76, 175, 80, 255]);

/// 把摄像头帧转换为预览图，按开关绘制外接框与轮廓
pub fn render_preview(
    frame: &RgbImage,
    result: Option<&ScanResult>,
    highlight_region: bool,
    highlight_outline: bool,
) -> RgbaImage {
    let mut preview: RgbaImage = frame.convert();
    let Some(result) = result else {
        return preview;
    };

    // 外接框连接定位图案中心，画在码图内侧而不是外缘
    if highlight_region {
        if let Some((x, y, w, h)) = result.bounding_box() {
            // 两圈加粗
            for inset in 0..2i32 {
                let rect = Rect::at(x as i32 - inset, y as i32 - inset)
                    .of_size((w as u32).max(1) + inset as u32 * 2, (h as u32).max(1) + inset as u32 * 2);
                draw_hollow_rect_mut(&mut preview, rect, REGION_COLOR);
            }
        }
    }

    if highlight_outline && result.corners.len() >= 2 {
        let n = result.corners.len();
        for i in 0..n {
            let a = result.corners[i];
            let b = result.corners[(i + 1) % n];
            draw_line_segment_mut(&mut preview, (a.x, a.y), (b.x, b.y), OUTLINE_COLOR);
        }
    }

    preview
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::CornerPoint;
    use image::Rgb;

    fn sample_result() -> ScanResult {
        ScanResult {
            text: "hello".into(),
            corners: vec![
                CornerPoint { x: 10.0, y: 10.0 },
                CornerPoint { x: 30.0, y: 10.0 },
                CornerPoint { x: 30.0, y: 30.0 },
                CornerPoint { x: 10.0, y: 30.0 },
            ],
        }
    }

    #[test]
    fn test_preview_without_result_is_plain_copy() {
        let frame = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        let preview = render_preview(&frame, None, true, true);
        assert_eq!(preview.dimensions(), (8, 8));
        assert_eq!(*preview.get_pixel(4, 4), Rgba([1, 2, 3, 255]));
    }

    #[test]
    fn test_region_box_is_drawn() {
        let frame = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let preview = render_preview(&frame, Some(&sample_result()), true, false);
        assert_eq!(*preview.get_pixel(10, 20), REGION_COLOR, "外接框左边应该被绘制");
        assert_eq!(*preview.get_pixel(20, 20), Rgba([0, 0, 0, 255]), "框内部不应被填充");
    }

    #[test]
    fn test_outline_is_drawn() {
        let frame = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let preview = render_preview(&frame, Some(&sample_result()), false, true);
        assert_eq!(*preview.get_pixel(20, 10), OUTLINE_COLOR, "上边轮廓应该被绘制");
    }

    #[test]
    fn test_highlights_disabled() {
        let frame = RgbImage::from_pixel(40, 40, Rgb([0, 0, 0]));
        let preview = render_preview(&frame, Some(&sample_result()), false, false);
        assert!(preview.pixels().all(|p| *p == Rgba([0, 0, 0, 255])), "关闭高亮后画面不变");
    }
}
