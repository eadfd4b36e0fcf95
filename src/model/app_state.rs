//! AppState：扫描界面的全部可变状态与状态迁移
//!
//! 这里不做任何IO，只描述"发生了什么事件 -> 状态如何变化"，
//! 由控制器在UI线程上驱动。

use std::path::{Path, PathBuf};

use crate::decoder::{ImageDecodeError, ScanResult};
use crate::model::status::{ScanStatus, MSG_CAMERA_UNAVAILABLE, MSG_NO_QR_FOUND};
use crate::model::url_classifier::is_url;
use crate::session::CameraError;

#[derive(Debug, Default)]
pub struct AppState {
    pub status: ScanStatus,
    pub camera_active: bool,
    /// 最近一次识别出的文本，空字符串表示没有
    pub decoded: String,
    /// 面向用户的错误提示，空字符串表示没有
    pub error: String,
    /// 上传控件当前选中的文件；每次识别结束后复位
    pub selected_file: Option<PathBuf>,
    /// 最近一次识别的结构化结果；只有文本时为 None
    pub last_detail: Option<ScanResult>,
    pending_image: Option<u64>,
    next_ticket: u64,
}

impl AppState {
    pub fn begin_camera_start(&mut self) {
        self.error.clear();
        self.status = ScanStatus::Starting;
    }

    pub fn camera_started(&mut self) {
        self.camera_active = true;
        self.status = ScanStatus::Scanning;
    }

    pub fn camera_failed(&mut self, error: &CameraError) {
        tracing::warn!("摄像头启动失败: {}", error);
        self.camera_active = false;
        self.status = ScanStatus::Failed;
        self.error = MSG_CAMERA_UNAVAILABLE.to_string();
    }

    pub fn camera_stopped(&mut self) {
        self.camera_active = false;
        self.status = ScanStatus::Stopped;
    }

    /// 处理一次摄像头检测；空文本或摄像头已关闭时忽略，返回是否有变化
    pub fn apply_detection(&mut self, text: &str, detail: Option<ScanResult>) -> bool {
        if !self.camera_active || text.is_empty() {
            return false;
        }
        self.decoded = text.to_string();
        self.last_detail = detail;
        self.status = ScanStatus::Detected;
        true
    }

    /// 开始识别一张图片，返回本次识别的票据
    pub fn begin_image_decode(&mut self, path: &Path) -> u64 {
        self.next_ticket += 1;
        self.pending_image = Some(self.next_ticket);
        self.selected_file = Some(path.to_path_buf());
        self.error.clear();
        self.status = ScanStatus::Starting;
        self.next_ticket
    }

    /// 图片识别完成；票据过期（已被新上传或清除取代）时忽略
    pub fn finish_image_decode(
        &mut self,
        ticket: u64,
        result: Result<ScanResult, ImageDecodeError>,
    ) -> bool {
        if self.pending_image != Some(ticket) {
            tracing::info!("丢弃过期的图片识别结果，票据 {}", ticket);
            return false;
        }
        self.pending_image = None;
        self.selected_file = None;

        match result {
            Ok(result) => {
                self.decoded = result.text.clone();
                self.last_detail = Some(result);
                self.error.clear();
                self.status = ScanStatus::Detected;
            }
            Err(e) => {
                tracing::info!("图片识别未成功: {}", e);
                self.decoded.clear();
                self.last_detail = None;
                self.error = MSG_NO_QR_FOUND.to_string();
                self.status = ScanStatus::NoQrFound;
            }
        }
        true
    }

    pub fn is_decoding_image(&self) -> bool {
        self.pending_image.is_some()
    }

    /// 清除结果；进行中的图片识别随之作废
    pub fn clear(&mut self) {
        self.decoded.clear();
        self.error.clear();
        self.last_detail = None;
        self.pending_image = None;
        self.selected_file = None;
        self.status = ScanStatus::Cleared;
    }

    pub fn mark_copied(&mut self) {
        self.status = ScanStatus::Copied;
    }

    pub fn can_copy(&self) -> bool {
        !self.decoded.is_empty()
    }

    /// 可以打开时返回要跳转的地址
    pub fn link_target(&self) -> Option<&str> {
        (!self.decoded.is_empty() && is_url(&self.decoded)).then_some(self.decoded.as_str())
    }
}
