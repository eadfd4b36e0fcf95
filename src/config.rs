//! 启动配置：高亮开关、采集节奏、日志级别

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::session::ScanOptions;
use crate::utils::fs::read_json_file;

/// 指定配置文件路径的环境变量
pub const CONFIG_ENV: &str = "ERWEIMA_CONFIG";
/// 未指定时在工作目录查找的文件名
pub const DEFAULT_CONFIG_FILE: &str = "erweima.json";

const MIN_FRAME_INTERVAL_MS: u64 = 10;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO失败: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON解析失败: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    pub highlight_region: bool,
    pub highlight_outline: bool,
    pub detailed_result: bool,
    pub frame_interval_ms: u64,
    pub log_level: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            highlight_region: true,
            highlight_outline: true,
            detailed_result: true,
            frame_interval_ms: 100,
            log_level: "info".to_string(),
        }
    }
}

impl ScanConfig {
    pub fn load(p: &Path) -> Result<Self, ConfigError> {
        read_json_file(p)
    }

    /// 按 环境变量 -> 工作目录文件 -> 默认值 的顺序解析配置
    pub fn resolve() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(p) => Self::load(&p),
            None => Ok(Self::default()),
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Some(p) = std::env::var_os(CONFIG_ENV) {
            return Some(PathBuf::from(p));
        }
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        local.is_file().then_some(local)
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            highlight_region: self.highlight_region,
            highlight_outline: self.highlight_outline,
            detailed_result: self.detailed_result,
            frame_interval: Duration::from_millis(self.frame_interval_ms.max(MIN_FRAME_INTERVAL_MS)),
        }
    }

    /// 无法识别的级别回退到 INFO
    pub fn tracing_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.trim()).unwrap_or(tracing::Level::INFO)
    }
}
