//! # scan 命令实现
//!
//! 列出每个文件类型按序号排好的分批计划，不调用处理器，也不改动任何文件。
//!
//! ## 依赖关系
//! - 使用 `cli/scan.rs` 定义的参数
//! - 使用 `batch/locator.rs`, `batch/scheduler.rs`
//! - 使用 `tabled` 输出表格

use crate::batch::{plan_batches, FileLocator};
use crate::cli::scan::ScanArgs;
use crate::config::AppSettings;
use crate::error::{LogBatchError, Result};
use crate::utils::output;

use tabled::{Table, Tabled};

/// 分批计划表格行
#[derive(Debug, Clone, Tabled)]
struct PlanRow {
    #[tabled(rename = "Batch")]
    batch: usize,
    #[tabled(rename = "Order Key")]
    order_key: u64,
    #[tabled(rename = "File")]
    file: String,
}

/// 执行 scan 命令
pub fn execute(args: ScanArgs) -> Result<()> {
    output::print_header("Log Batch Plan");

    let settings = AppSettings::load(args.discovery.config.as_deref())?;
    let file_types = args.discovery.file_types();
    if file_types.is_empty() {
        return Err(LogBatchError::InvalidArgument(
            "Please specify at least one file type, e.g. --filetype \"smtp, pop3\"".to_string(),
        ));
    }

    let folder = settings.folder_path(args.discovery.folder_path.as_deref());
    let extension = settings.extension(args.discovery.extension.as_deref());
    let batch_size = settings.batch_size(args.discovery.batch_size)?;
    let locator = FileLocator::new(folder).with_extension(&extension);

    output::print_info(&format!(
        "Folder: '{}', extension: '.{}', batch size: {}",
        locator.folder().display(),
        locator.extension(),
        batch_size
    ));

    let mut total = 0;
    for file_type in &file_types {
        let files = locator.locate(file_type)?;
        if files.is_empty() {
            output::print_warning(&format!("No '{}' files found", file_type));
            continue;
        }
        total += files.len();

        let batches = plan_batches(files, batch_size)?;
        output::print_info(&format!(
            "'{}': {} batches",
            file_type,
            batches.len()
        ));

        let rows: Vec<PlanRow> = batches
            .iter()
            .flat_map(|b| {
                b.files.iter().map(move |f| PlanRow {
                    batch: b.index,
                    order_key: f.order_key,
                    file: f.file_name(),
                })
            })
            .collect();
        println!("{}", Table::new(&rows));
    }

    output::print_separator();
    output::print_done(&format!(
        "{} files across {} file types",
        total,
        file_types.len()
    ));

    Ok(())
}
