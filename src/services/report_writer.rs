//! 结果写入服务 - 业务能力层
//!
//! 只负责"把一次运行的结果写成 JSON 文件"，不关心流程

use std::path::PathBuf;

use serde::Serialize;
use tokio::fs;
use tracing::debug;

use crate::error::FileError;

/// 结果写入服务
///
/// 职责：
/// - 在结果目录下写 `run-<时间戳>.json`
/// - 目录不存在时自动创建
pub struct ReportWriter {
    results_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(results_dir: impl Into<PathBuf>) -> Self {
        Self {
            results_dir: results_dir.into(),
        }
    }

    /// 写入一次运行的结果，返回文件路径
    pub async fn write<T: Serialize>(&self, report: &T) -> Result<PathBuf, FileError> {
        let dir_display = self.results_dir.display().to_string();
        fs::create_dir_all(&self.results_dir)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: dir_display,
                source,
            })?;

        let file_name = format!(
            "run-{}.json",
            chrono::Local::now().format("%Y%m%d-%H%M%S%.3f")
        );
        let path = self.results_dir.join(file_name);
        let path_display = path.display().to_string();

        let content =
            serde_json::to_string_pretty(report).map_err(|source| FileError::JsonParseFailed {
                path: path_display.clone(),
                source,
            })?;

        debug!("写入运行结果: {} ({} 字节)", path_display, content.len());
        fs::write(&path, content)
            .await
            .map_err(|source| FileError::WriteFailed {
                path: path_display,
                source,
            })?;

        Ok(path)
    }
}
