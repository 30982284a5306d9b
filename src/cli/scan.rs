//! # scan 子命令 CLI 定义
//!
//! 预览每个文件类型的分批计划
//!
//! ## 依赖关系
//! - 被 `cli/mod.rs` 使用
//! - 参数传递给 `commands/scan.rs`

use super::DiscoveryArgs;
use clap::Args;

/// scan 子命令参数
#[derive(Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub discovery: DiscoveryArgs,
}
