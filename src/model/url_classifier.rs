//! 链接识别：判断识别结果能否作为 http/https 链接打开

use url::Url;

/// 只有能解析为绝对URL且协议为 http/https 时才可打开
pub fn is_url(text: &str) -> bool {
    match Url::parse(text) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

/// 结果面板下方的说明文字
pub fn link_caption(text: &str) -> &'static str {
    if text.is_empty() {
        ""
    } else if is_url(text) {
        "检测到链接，可以直接打开"
    } else {
        "普通文本，仅支持复制"
    }
}
