//! 扫描控制器：AppState 的唯一修改者
//!
//! 持有延迟创建的扫描会话，响应用户意图（启动/停止/上传/清除/复制/打开），
//! 并消费工作线程发回的事件。所有方法都在UI线程上调用。

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::decoder::{decode_image_file, DecodeError, ImageDecodeError, QrDecoder};
use crate::model::app_state::AppState;
use crate::session::{
    AppEvent, CameraError, CameraSource, EventSender, PreviewSender, ScanOptions, ScanSession,
    SessionError, SessionEvent, StartOutcome,
};

/// 处理事件后界面需要做的刷新
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    /// 事件被丢弃或没有可见变化
    Nothing,
    /// 状态变化，重新投影视图模型
    State,
}

pub struct ScanController {
    state: AppState,
    session: Option<ScanSession>,
    camera: Arc<dyn CameraSource>,
    decoder: Arc<dyn QrDecoder>,
    options: ScanOptions,
    events: EventSender,
    previews: PreviewSender,
    sessions_created: usize,
}

impl ScanController {
    pub fn new(
        camera: Arc<dyn CameraSource>,
        decoder: Arc<dyn QrDecoder>,
        options: ScanOptions,
        events: EventSender,
        previews: PreviewSender,
    ) -> Self {
        Self {
            state: AppState::default(),
            session: None,
            camera,
            decoder,
            options,
            events,
            previews,
            sessions_created: 0,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn sessions_created(&self) -> usize {
        self.sessions_created
    }

    /// 启动/停止切换按钮
    pub fn toggle_camera(&mut self) {
        let live = self.session.as_ref().is_some_and(ScanSession::is_live);
        if self.state.camera_active || live {
            self.stop_camera();
        } else if let Err(e) = self.start_camera() {
            tracing::error!("启动扫描会话失败: {}", e);
        }
    }

    /// 会话在第一次启动时创建，之后一直复用
    pub fn start_camera(&mut self) -> Result<StartOutcome, SessionError> {
        let session = self.session.get_or_insert_with(|| {
            self.sessions_created += 1;
            ScanSession::create(
                self.camera.clone(),
                self.decoder.clone(),
                self.options.clone(),
                self.events.clone(),
                self.previews.clone(),
            )
        });

        match session.start() {
            Ok(StartOutcome::AlreadyRunning) => Ok(StartOutcome::AlreadyRunning),
            Ok(launched) => {
                self.state.begin_camera_start();
                Ok(launched)
            }
            Err(e) => {
                self.state.camera_failed(&CameraError::Unavailable(e.to_string()));
                Err(e)
            }
        }
    }

    /// 停止摄像头；从未启动过也安全
    pub fn stop_camera(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.stop();
        }
        self.state.camera_stopped();
    }

    /// 在工作线程上识别图片，结果以 `ImageDecoded` 事件返回
    pub fn upload_image(&mut self, path: PathBuf) -> u64 {
        let ticket = self.state.begin_image_decode(&path);
        tracing::info!("开始识别图片: {}", path.display());

        let decoder = self.decoder.clone();
        let events = self.events.clone();
        let detailed = self.options.detailed_result;
        let spawned = thread::Builder::new()
            .name(format!("qr-image-{}", ticket))
            .spawn(move || {
                let result = decode_image_file(decoder.as_ref(), &path, detailed);
                // UI已退出时通道关闭，结果无人接收
                let _ = events.send(AppEvent::ImageDecoded { ticket, result });
            });

        if let Err(e) = spawned {
            tracing::error!("无法启动识别线程: {}", e);
            let error = ImageDecodeError::Decode(DecodeError::Corrupt(e.to_string()));
            self.state.finish_image_decode(ticket, Err(error));
        }
        ticket
    }

    pub fn clear(&mut self) {
        self.state.clear();
    }

    /// 复制识别结果；写入失败只记录日志
    pub fn copy_decoded<F, E>(&mut self, write: F) -> bool
    where
        F: FnOnce(&str) -> Result<(), E>,
        E: Display,
    {
        if !self.state.can_copy() {
            return false;
        }
        if let Err(e) = write(&self.state.decoded) {
            tracing::warn!("复制到剪贴板失败: {}", e);
        } else {
            tracing::info!("识别结果已复制，长度: {} 字符", self.state.decoded.len());
        }
        self.state.mark_copied();
        true
    }

    /// 仅当结果是 http/https 链接时才跳转，跳转目标即识别文本本身
    pub fn open_link<F, E>(&self, navigate: F) -> bool
    where
        F: FnOnce(&str) -> Result<(), E>,
        E: Display,
    {
        let Some(target) = self.state.link_target() else {
            return false;
        };
        tracing::info!("打开链接: {}", target);
        if let Err(e) = navigate(target) {
            tracing::warn!("打开链接失败: {}", e);
        }
        true
    }

    pub fn handle_event(&mut self, event: AppEvent) -> Refresh {
        match event {
            AppEvent::Session(event) => self.handle_session_event(event),
            AppEvent::ImageDecoded { ticket, result } => {
                if self.state.finish_image_decode(ticket, result) {
                    Refresh::State
                } else {
                    Refresh::Nothing
                }
            }
        }
    }

    fn handle_session_event(&mut self, event: SessionEvent) -> Refresh {
        let Some(session) = self.session.as_mut() else {
            return Refresh::Nothing;
        };

        match event {
            SessionEvent::Started { generation } if session.accepts(generation) => {
                self.state.camera_started();
                Refresh::State
            }
            SessionEvent::Unavailable { generation, error } if session.accepts(generation) => {
                session.stop();
                self.state.camera_failed(&error);
                Refresh::State
            }
            SessionEvent::Detected { generation, detection } if session.accepts(generation) => {
                if self.state.apply_detection(&detection.text, detection.details) {
                    tracing::debug!("检测到二维码: {}", detection.text);
                    Refresh::State
                } else {
                    Refresh::Nothing
                }
            }
            _ => Refresh::Nothing,
        }
    }

    /// 预览帧是否来自当前存活的采集；停止后最后一帧保持不变
    pub fn accepts_preview(&self, generation: u64) -> bool {
        self.session.as_ref().is_some_and(|s| s.accepts(generation))
    }

    /// 程序退出：先停止再销毁，会话只销毁一次
    pub fn shutdown(&mut self) {
        if let Some(session) = self.session.take() {
            session.destroy();
        }
        self.state.camera_active = false;
    }
}
