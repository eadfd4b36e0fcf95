//! 二维码扫描工具库
//!
//! 提供摄像头连续扫描会话、单张图片识别、链接识别与界面状态机，
//! 遵循MVVM架构模式：model 只描述状态，vm 驱动状态并投影给 Slint 界面

pub mod config;
pub mod decoder;
pub mod model;
pub mod session;
pub mod utils;
pub mod vm;

// 重新导出主要类型
pub use config::{ConfigError, ScanConfig};
pub use decoder::{decode_image_file, ImageDecodeError, QrDecoder, RxingDecoder, ScanResult};
pub use model::{app_state::AppState, status::ScanStatus, url_classifier::is_url};
pub use session::{
    preview_channel, AppEvent, CameraSource, NokhwaCamera, PreviewFrame, PreviewReceiver, ScanOptions,
    ScanSession, SessionEvent,
};
pub use vm::{controller::{Refresh, ScanController}, view_model::ViewModel};
