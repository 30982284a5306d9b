//! # CLI 模块
//!
//! 使用 `clap` 定义命令行参数和子命令。
//!
//! ## 命令结构
//! - `ingest`: 分批导入日志文件并执行后处理
//! - `scan`: 只预览分批计划，不处理文件
//!
//! ## 依赖关系
//! - 被 `main.rs` 使用
//! - 子模块: ingest, scan

pub mod ingest;
pub mod scan;

use clap::{Args, Parser, Subcommand};
use std::collections::HashSet;
use std::path::PathBuf;

/// logbatch - 日志文件批量导入工具
#[derive(Parser)]
#[command(name = "logbatch")]
#[command(version)]
#[command(about = "Batch ingestion of numbered log files", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// 可用的子命令
#[derive(Subcommand)]
pub enum Commands {
    /// Process log files in ordered batches and apply post-processing
    Ingest(ingest::IngestArgs),

    /// Show the ordered batch plan without processing anything
    Scan(scan::ScanArgs),
}

/// 文件发现相关的公共参数
#[derive(Args, Debug, Clone)]
pub struct DiscoveryArgs {
    /// File types to process, in order (e.g. "smtp, pop3")
    #[arg(long = "filetype", required = true, value_delimiter = ',', num_args = 1..)]
    pub file_types: Vec<String>,

    /// Directory containing the log files
    #[arg(long)]
    pub folder_path: Option<PathBuf>,

    /// Log file extension
    #[arg(long)]
    pub extension: Option<String>,

    /// Maximum number of files processed concurrently in one batch
    #[arg(long)]
    pub batch_size: Option<usize>,

    /// Settings file (defaults to ./appsettings.json when present)
    #[arg(long, env = "LOGBATCH_CONFIG")]
    pub config: Option<PathBuf>,
}

impl DiscoveryArgs {
    /// 去除空白、空项与重复项后的文件类型列表，保持首次出现的顺序
    pub fn file_types(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.file_types
            .iter()
            .map(|t| t.trim().trim_matches('"').trim().to_string())
            .filter(|t| !t.is_empty() && seen.insert(t.clone()))
            .collect()
    }
}
