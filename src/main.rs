//! # logbatch - 日志文件批量导入工具
//!
//! 按文件名序号分批处理某一目录下的日志文件，成功后执行保留、归档或删除。
//!
//! ## 子命令
//! - `ingest` - 分批处理并执行后处理（可延迟到全部结束后）
//! - `scan`   - 预览分批计划
//!
//! ## 依赖关系
//! ```text
//! main.rs
//!   ├── cli/        (命令行参数定义)
//!   ├── commands/   (命令执行逻辑)
//!   │     ├── batch/     (定位、分批、处理、后处理)
//!   │     └── processor/ (外部处理协议)
//!   ├── config.rs   (appsettings.json)
//!   ├── utils/      (输出与进度条)
//!   └── error.rs    (错误处理)
//! ```

mod batch;
mod cli;
mod commands;
mod config;
mod error;
mod processor;
mod utils;

use clap::Parser;
use cli::Cli;
use std::error::Error;

fn main() {
    // Initialize colored output for Windows compatibility
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    let cli = Cli::parse();

    if let Err(e) = commands::run(cli.command) {
        utils::output::print_error(&format!("{}", e));
        let mut source = e.source();
        while let Some(cause) = source {
            utils::output::print_error(&format!("  caused by: {}", cause));
            source = cause.source();
        }
        std::process::exit(1);
    }
}
