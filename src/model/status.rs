//! 扫描状态：当前阶段的枚举与可读标签

use std::fmt;

/// 摄像头不可用时给用户的提示（权限被拒绝与无设备共用）
pub const MSG_CAMERA_UNAVAILABLE: &str = "无法访问摄像头，请检查权限或设备，也可以改用上传图片";
/// 图片中没有可识别的二维码
pub const MSG_NO_QR_FOUND: &str = "未识别到二维码，请尝试更清晰的图片";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScanStatus {
    #[default]
    Idle,
    Starting,
    Scanning,
    Detected,
    Failed,
    Stopped,
    Cleared,
    NoQrFound,
    Copied,
}

impl ScanStatus {
    /// 状态徽标上显示的文本
    pub fn label(self) -> &'static str {
        match self {
            ScanStatus::Idle => "空闲",
            ScanStatus::Starting => "启动中...",
            ScanStatus::Scanning => "扫描中",
            ScanStatus::Detected => "已识别",
            ScanStatus::Failed => "失败",
            ScanStatus::Stopped => "已停止",
            ScanStatus::Cleared => "已清除",
            ScanStatus::NoQrFound => "未找到二维码",
            ScanStatus::Copied => "已复制",
        }
    }

    /// 是否属于失败类状态（用于徽标配色）
    pub fn is_failure(self) -> bool {
        matches!(self, ScanStatus::Failed | ScanStatus::NoQrFound)
    }
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_status_is_idle() {
        assert_eq!(ScanStatus::default(), ScanStatus::Idle);
        assert_eq!(ScanStatus::Idle.to_string(), "空闲");
    }

    #[test]
    fn test_failure_statuses() {
        assert!(ScanStatus::Failed.is_failure());
        assert!(ScanStatus::NoQrFound.is_failure());
        assert!(!ScanStatus::Detected.is_failure(), "已识别不是失败状态");
        assert!(!ScanStatus::Stopped.is_failure(), "已停止不是失败状态");
    }
}
