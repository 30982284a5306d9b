//! # 日志文件定位器
//!
//! 在源目录中查找 `<tag>_<digits>.<ext>` 形式的文件，并按文件名中的序号排序。
//!
//! ## 功能
//! - glob 模式预筛选（`<tag>_*.<ext>`）
//! - 显式的序号解析器，解析失败即为致命的发现错误
//! - `<tag>_<x>_<n>.<ext>` 属于另一个类型（如 `smtp_in`），查找 `<tag>` 时跳过
//! - 只扫描单层目录，不递归
//!
//! ## 依赖关系
//! - 被 `batch/scheduler.rs` 和 `commands/scan.rs` 调用
//! - 使用 `walkdir` 遍历目录，`glob` 匹配文件名

use crate::error::{LogBatchError, OrderKeyError, Result};

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// 默认日志文件扩展名
pub const DEFAULT_EXTENSION: &str = "txt";

/// 待处理文件描述（不持有任何打开的资源）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFile {
    /// 文件路径
    pub path: PathBuf,
    /// 文件名中解析出的序号
    pub order_key: u64,
}

impl CandidateFile {
    /// 文件名（不含目录）
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default()
    }
}

/// 日志文件定位器
pub struct FileLocator {
    /// 源目录
    folder: PathBuf,
    /// 扩展名（不含点）
    extension: String,
}

impl FileLocator {
    /// 创建新的定位器
    pub fn new(folder: impl Into<PathBuf>) -> Self {
        Self {
            folder: folder.into(),
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }

    /// 设置扩展名（允许带前导点）
    pub fn with_extension(mut self, extension: &str) -> Self {
        let ext = extension.trim().trim_start_matches('.');
        if !ext.is_empty() {
            self.extension = ext.to_string();
        }
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// 查找某一类型的全部文件，按序号升序排列
    ///
    /// 没有匹配文件时返回空列表；任何匹配文件的序号无法解析时返回错误。
    pub fn locate(&self, file_type: &str) -> Result<Vec<CandidateFile>> {
        if !self.folder.is_dir() {
            return Err(LogBatchError::DirectoryNotFound {
                path: self.folder.display().to_string(),
            });
        }

        let pattern = format!(
            "{}_*.{}",
            glob::Pattern::escape(file_type),
            glob::Pattern::escape(&self.extension)
        );
        let glob_pattern = glob::Pattern::new(&pattern).map_err(|e| {
            LogBatchError::InvalidArgument(format!("Invalid file type '{}': {}", file_type, e))
        })?;

        let walker = WalkDir::new(&self.folder)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name();

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| LogBatchError::FileReadError {
                path: self.folder.display().to_string(),
                source: e.into(),
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            // 非 UTF-8 文件名按替换字符交给解析器，从而报错而不是静默跳过
            let name = entry.file_name().to_string_lossy();
            if !glob_pattern.matches(&name)
                || belongs_to_longer_type(&name, file_type, &self.extension)
            {
                continue;
            }

            let order_key = parse_order_key(&name, file_type, &self.extension).map_err(|e| {
                LogBatchError::InvalidOrderKey {
                    path: entry.path().display().to_string(),
                    source: e,
                }
            })?;

            files.push(CandidateFile {
                path: entry.path().to_path_buf(),
                order_key,
            });
        }

        // 稳定排序：序号相同时保持发现顺序
        files.sort_by_key(|f| f.order_key);
        Ok(files)
    }
}

/// 序号部分仍含 `_` 时，文件属于以 `<tag>_` 为前缀的另一个类型
fn belongs_to_longer_type(file_name: &str, file_type: &str, extension: &str) -> bool {
    file_name
        .strip_prefix(file_type)
        .and_then(|s| s.strip_prefix('_'))
        .and_then(|s| s.strip_suffix(extension))
        .and_then(|s| s.strip_suffix('.'))
        .is_some_and(|middle| middle.contains('_'))
}

/// 从 `<tag>_<digits>.<ext>` 中解析出序号
pub fn parse_order_key(
    file_name: &str,
    file_type: &str,
    extension: &str,
) -> std::result::Result<u64, OrderKeyError> {
    let rest = file_name
        .strip_prefix(file_type)
        .and_then(|s| s.strip_prefix('_'))
        .ok_or_else(|| OrderKeyError::MissingPrefix(file_type.to_string()))?;

    let digits = rest
        .strip_suffix(extension)
        .and_then(|s| s.strip_suffix('.'))
        .ok_or_else(|| OrderKeyError::MissingExtension(extension.to_string()))?;

    if digits.is_empty() {
        return Err(OrderKeyError::Empty);
    }
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_digit()) {
        return Err(OrderKeyError::NonDigit(c));
    }

    digits.parse::<u64>().map_err(|_| OrderKeyError::Overflow)
}
