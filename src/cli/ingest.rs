//! # ingest 子命令 CLI 定义
//!
//! 分批处理日志文件并执行保留 / 归档 / 删除
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/ingest.rs`

use super::DiscoveryArgs;
use clap::{Args, ValueEnum};
use std::path::PathBuf;

/// 处理成功后的文件去向
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq, Default)]
pub enum PostProcessMode {
    /// Leave the file where it is
    #[default]
    Keep,
    /// Move the file into the archive directory
    Archive,
    /// Remove the file
    Delete,
}

impl std::fmt::Display for PostProcessMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PostProcessMode::Keep => write!(f, "keep"),
            PostProcessMode::Archive => write!(f, "archive"),
            PostProcessMode::Delete => write!(f, "delete"),
        }
    }
}

/// ingest 子命令参数
#[derive(Args, Debug)]
pub struct IngestArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,

    /// Directory receiving archived files
    #[arg(long)]
    pub archive_path: Option<PathBuf>,

    /// What to do with a file after it was processed successfully
    #[arg(long, value_enum, default_value_t = PostProcessMode::Keep)]
    pub post_process: PostProcessMode,

    /// Apply post-processing only after every file type and batch has finished
    #[arg(long, default_value_t = false)]
    pub deferred: bool,

    // ─────────────────────────────────────────────────────────────
    // External processor
    // ─────────────────────────────────────────────────────────────
    /// Program invoked once per log file (exit status 0 means success)
    #[arg(long)]
    pub processor: Option<String>,

    /// Argument passed to the processor; '{}' is replaced by the file path
    #[arg(long = "processor-arg", allow_hyphen_values = true)]
    pub processor_args: Vec<String>,

    /// Hide the progress bar
    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}
