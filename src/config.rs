//! # 配置文件
//!
//! 从 `appsettings.json` 读取默认目录、扩展名、批次大小和外部处理命令。
//!
//! ```json
//! {
//!   "LogFileSettings": { "FolderPath": "logs", "ArchivePath": "logs/archive" },
//!   "Processor": { "Command": "log-parser", "Args": ["--db", "logs.db"] }
//! }
//! ```
//!
//! 优先级：命令行参数 > 配置文件 > 内置默认值。
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `serde` / `serde_json`

use crate::batch::{DEFAULT_BATCH_SIZE, DEFAULT_EXTENSION};
use crate::error::{LogBatchError, Result};

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// 默认配置文件名（在当前工作目录中查找）
pub const DEFAULT_SETTINGS_FILE: &str = "appsettings.json";

/// 默认源目录
pub const DEFAULT_FOLDER_PATH: &str = "logs";

/// 默认归档目录
pub const DEFAULT_ARCHIVE_PATH: &str = "logs/archive";

/// 配置文件顶层结构
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AppSettings {
    #[serde(default)]
    pub log_file_settings: LogFileSettings,

    #[serde(default)]
    pub processor: Option<ProcessorSettings>,
}

/// 日志文件相关配置
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LogFileSettings {
    pub folder_path: Option<PathBuf>,
    pub archive_path: Option<PathBuf>,
    pub extension: Option<String>,
    pub batch_size: Option<usize>,
}

/// 外部处理命令配置
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ProcessorSettings {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl AppSettings {
    /// 读取配置
    ///
    /// 显式指定的文件必须存在；未指定时默认文件缺失则使用内置默认值。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.is_file() {
                    return Err(LogBatchError::ConfigNotFound {
                        path: path.display().to_string(),
                    });
                }
                Self::from_file(path)
            }
            None => {
                let default = Path::new(DEFAULT_SETTINGS_FILE);
                if default.is_file() {
                    Self::from_file(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| LogBatchError::FileReadError {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::parse(&content, path)
    }

    fn parse(content: &str, path: &Path) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(content).map_err(|e| LogBatchError::ConfigParseError {
            path: path.display().to_string(),
            source: e,
        })
    }

    /// 源目录
    pub fn folder_path(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.log_file_settings.folder_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_FOLDER_PATH))
    }

    /// 归档目录
    pub fn archive_path(&self, cli: Option<&Path>) -> PathBuf {
        cli.map(Path::to_path_buf)
            .or_else(|| self.log_file_settings.archive_path.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ARCHIVE_PATH))
    }

    /// 扩展名
    pub fn extension(&self, cli: Option<&str>) -> String {
        cli.map(str::to_string)
            .or_else(|| self.log_file_settings.extension.clone())
            .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
    }

    /// 批次大小（必须 >= 1）
    pub fn batch_size(&self, cli: Option<usize>) -> Result<usize> {
        let size = cli
            .or(self.log_file_settings.batch_size)
            .unwrap_or(DEFAULT_BATCH_SIZE);
        if size == 0 {
            return Err(LogBatchError::InvalidArgument(
                "Batch size must be at least 1".to_string(),
            ));
        }
        Ok(size)
    }
}
