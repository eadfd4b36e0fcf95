//! 基于 rxing 的二维码识别器

use std::collections::HashSet;

use image::GrayImage;
use rxing::common::HybridBinarizer;
use rxing::{
    BarcodeFormat, BinaryBitmap, DecodeHintValue, DecodeHints, Exceptions, Luma8LuminanceSource,
    MultiFormatReader, Reader,
};

use super::{CornerPoint, DecodeError, QrDecoder, ScanResult};

/// 只识别 QR 码，始终开启 TryHarder
#[derive(Debug, Clone, Default)]
pub struct RxingDecoder;

impl RxingDecoder {
    fn hints(&self) -> DecodeHints {
        DecodeHints::default()
            .with(DecodeHintValue::TryHarder(true))
            .with(DecodeHintValue::PossibleFormats(HashSet::from([BarcodeFormat::QR_CODE])))
    }
}

impl QrDecoder for RxingDecoder {
    fn decode(&self, frame: &GrayImage) -> Result<Option<ScanResult>, DecodeError> {
        let (width, height) = frame.dimensions();
        if width == 0 || height == 0 {
            return Ok(None);
        }

        let luma_source = Luma8LuminanceSource::new(frame.as_raw().clone(), width, height);
        let mut bitmap = BinaryBitmap::new(HybridBinarizer::new(luma_source));
        let mut reader = MultiFormatReader::default();

        match reader.decode_with_hints(&mut bitmap, &self.hints()) {
            Ok(result) => {
                let corners = result
                    .getPoints()
                    .iter()
                    .map(|p| CornerPoint { x: p.x, y: p.y })
                    .collect();
                Ok(Some(ScanResult { text: result.getText().to_string(), corners }))
            }
            // 画面里没有二维码不算错误
            Err(Exceptions::NotFoundException(_)) => Ok(None),
            Err(e) => Err(DecodeError::Corrupt(format!("{:?}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::test_support::render_qr;
    use image::Luma;

    #[test]
    fn test_decode_rendered_qr() {
        let img = render_qr("hello", 6);
        let result = RxingDecoder::default().decode(&img).expect("识别不应报错");
        let result = result.expect("应该找到二维码");
        assert_eq!(result.text, "hello");
        assert!(result.corners.len() >= 3, "二维码至少有三个定位点");
    }

    #[test]
    fn test_blank_frame_yields_none() {
        let img = GrayImage::from_pixel(64, 64, Luma([255u8]));
        let result = RxingDecoder::default().decode(&img);
        assert!(!matches!(result, Ok(Some(_))), "空白画面不应识别出内容");
    }

    #[test]
    fn test_empty_frame_is_skipped() {
        let img = GrayImage::new(0, 0);
        assert_eq!(RxingDecoder::default().decode(&img), Ok(None));
    }
}
