//! 摄像头来源：打开设备并逐帧取RGB图像

use image::RgbImage;
use nokhwa::pixel_format::RgbFormat;
use nokhwa::utils::{ApiBackend, CameraIndex, RequestedFormat, RequestedFormatType};
use nokhwa::Camera;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("没有可用的摄像头")]
    NoDevice,
    #[error("摄像头无法打开: {0}")]
    Unavailable(String),
    #[error("读取画面失败: {0}")]
    Frame(String),
}

/// 可以被打开的摄像头；`open` 在采集线程里调用，返回的流只在该线程使用
pub trait CameraSource: Send + Sync {
    fn open(&self) -> Result<Box<dyn FrameStream>, CameraError>;
}

pub trait FrameStream {
    /// 阻塞直到下一帧可用
    fn next_frame(&mut self) -> Result<RgbImage, CameraError>;
}

/// 系统默认摄像头（只使用第一个设备）
#[derive(Debug, Default, Clone)]
pub struct NokhwaCamera;

impl CameraSource for NokhwaCamera {
    fn open(&self) -> Result<Box<dyn FrameStream>, CameraError> {
        ensure_device(nokhwa::query(ApiBackend::Auto))?;

        let format = RequestedFormat::new::<RgbFormat>(RequestedFormatType::AbsoluteHighestFrameRate);
        let mut camera = Camera::new(CameraIndex::Index(0), format)
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;
        camera
            .open_stream()
            .map_err(|e| CameraError::Unavailable(e.to_string()))?;

        tracing::info!("摄像头已打开: {}", camera.info().human_name());
        Ok(Box::new(NokhwaStream { camera }))
    }
}

/// 枚举结果为空时报告无设备；枚举本身失败时仍尝试直接打开
fn ensure_device<T, E: std::fmt::Display>(query: Result<Vec<T>, E>) -> Result<(), CameraError> {
    match query {
        Ok(devices) if devices.is_empty() => Err(CameraError::NoDevice),
        Ok(_) => Ok(()),
        Err(e) => {
            tracing::debug!("枚举摄像头失败，直接尝试打开默认设备: {}", e);
            Ok(())
        }
    }
}

struct NokhwaStream {
    camera: Camera,
}

impl FrameStream for NokhwaStream {
    fn next_frame(&mut self) -> Result<RgbImage, CameraError> {
        let buffer = self.camera.frame().map_err(|e| CameraError::Frame(e.to_string()))?;
        let decoded = buffer
            .decode_image::<RgbFormat>()
            .map_err(|e| CameraError::Frame(e.to_string()))?;
        let (width, height) = (decoded.width(), decoded.height());
        RgbImage::from_raw(width, height, decoded.into_raw())
            .ok_or_else(|| CameraError::Frame("帧尺寸与数据长度不一致".into()))
    }
}

impl Drop for NokhwaStream {
    fn drop(&mut self) {
        if let Err(e) = self.camera.stop_stream() {
            tracing::warn!("关闭摄像头流失败: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_device_list_is_no_device() {
        assert_eq!(ensure_device::<u32, String>(Ok(vec![])), Err(CameraError::NoDevice));
        assert_eq!(ensure_device::<u32, String>(Ok(vec![0])), Ok(()));
    }

    #[test]
    fn test_query_failure_falls_through_to_open() {
        let query: Result<Vec<u32>, String> = Err("backend not supported".into());
        assert_eq!(ensure_device(query), Ok(()), "枚举失败不应阻止打开摄像头");
    }
}
