//! 视图模型：把 AppState 投影成界面需要的展示值

use crate::model::app_state::AppState;
use crate::model::status::ScanStatus;
use crate::model::url_classifier::link_caption;
use crate::vm::bridge::*;

#[derive(Debug, Clone, PartialEq)]
pub struct ViewModel {
    pub status_text: String,
    pub status_color: (u8, u8, u8),
    pub camera_active: bool,
    pub toggle_label: &'static str,
    /// 结果面板文本（没有结果时为占位文字）
    pub output_text: String,
    pub has_result: bool,
    pub error_text: String,
    pub can_copy: bool,
    pub can_open_link: bool,
    pub link_caption: &'static str,
    /// 二维码在画面中的位置，没有定位点时为空
    pub region_caption: String,
    pub selected_file: String,
}

impl ViewModel {
    pub fn from_state(state: &AppState) -> Self {
        let has_result = !state.decoded.is_empty();
        Self {
            status_text: state.status.label().to_string(),
            status_color: status_color(state.status),
            camera_active: state.camera_active,
            toggle_label: if state.camera_active { LABEL_STOP_CAMERA } else { LABEL_START_CAMERA },
            output_text: if has_result { state.decoded.clone() } else { PLACEHOLDER_NO_RESULT.to_string() },
            has_result,
            error_text: state.error.clone(),
            can_copy: state.can_copy(),
            can_open_link: state.link_target().is_some(),
            link_caption: link_caption(&state.decoded),
            region_caption: state
                .last_detail
                .as_ref()
                .and_then(|d| d.bounding_box())
                .map(|(x, y, w, h)| {
                    format!("{}: ({:.0}, {:.0}) {:.0}×{:.0}", REGION_CAPTION_PREFIX, x, y, w, h)
                })
                .unwrap_or_default(),
            selected_file: state
                .selected_file
                .as_ref()
                .and_then(|p| p.file_name())
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default(),
        }
    }
}

fn status_color(status: ScanStatus) -> (u8, u8, u8) {
    match status {
        ScanStatus::Starting | ScanStatus::Scanning => COLOR_BUSY,
        ScanStatus::Detected | ScanStatus::Copied => COLOR_SUCCESS,
        s if s.is_failure() => COLOR_FAILURE,
        _ => COLOR_NEUTRAL,
    }
}
