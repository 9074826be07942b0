// src/export.rs

use crate::error::ExportError;
use crate::simulation::RunData;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

/// 运行数据的 JSON 表示：顶层按实体分为 "UAV" 与 "target"。
pub fn to_json(data: &RunData) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// 将运行数据写入 JSON 文件。
pub fn save_json(data: &RunData, path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let json = to_json(data)?;
    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;
    info!(path = %path.display(), steps = data.step_count(), "run data exported");
    Ok(())
}
