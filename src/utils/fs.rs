//! IO helper: read JSON files

use std::{fs::File, io::BufReader, path::Path};

use serde::de::DeserializeOwned;

use crate::config::ConfigError;

/// 从文件读取JSON数据
pub fn read_json_file<T: DeserializeOwned>(p: &Path) -> Result<T, ConfigError> {
    let f = File::open(p)?;
    let rdr = BufReader::new(f);
    let v: T = serde_json::from_reader(rdr)?;
    Ok(v)
}
