//! VM桥接层：连接Slint UI与扫描控制器
//!
//! 注意：窗口绑定的具体实现在main.rs中，因为依赖于Slint生成的类型
//! 这里只提供公共常量

// === 常量定义（消除魔法值） ===
pub const WINDOW_TITLE: &str = "二维码扫描";
pub const LABEL_START_CAMERA: &str = "启动摄像头";
pub const LABEL_STOP_CAMERA: &str = "停止摄像头";
pub const PLACEHOLDER_NO_RESULT: &str = "暂无结果，请扫描或上传二维码";
pub const DIALOG_PICK_IMAGE: &str = "选择包含二维码的图片";
pub const FILTER_IMAGES: &str = "图片";
pub const REGION_CAPTION_PREFIX: &str = "定位区域";
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif", "webp"];

// 状态徽标配色（RGB）
pub const COLOR_NEUTRAL: (u8, u8, u8) = (96, 125, 139);
pub const COLOR_BUSY: (u8, u8, u8) = (33, 150, 243);
pub const COLOR_SUCCESS: (u8, u8, u8) = (67, 160, 71);
pub const COLOR_FAILURE: (u8, u8, u8) = (229, 57, 53);
