//! # ingest 命令实现
//!
//! 解析配置与参数，构造处理器和后处理策略，交给批次调度器执行。
//!
//! ## 功能
//! - 合并命令行参数与 `appsettings.json`
//! - 选择外部命令处理器或内置检查处理器
//! - 归档模式下预先创建归档目录
//! - 输出运行统计
//!
//! ## 依赖关系
//! - 使用 `cli/ingest.rs` 定义的参数
//! - 使用 `batch/`, `processor/`, `config.rs`
//! - 使用 `utils/output.rs`, `utils/progress.rs`

use crate::batch::{BatchScheduler, Disposition, FileLocator, PostProcessor, RunSummary, TimingMode};
use crate::cli::ingest::{IngestArgs, PostProcessMode};
use crate::config::AppSettings;
use crate::error::{LogBatchError, Result};
use crate::processor::{CommandProcessorFactory, InspectProcessorFactory, ProcessorFactory};
use crate::utils::{output, progress};

use std::fs;
use std::path::Path;

/// 失败文件最多列出的数量
const MAX_LISTED_FAILURES: usize = 10;

/// 执行 ingest 命令
pub fn execute(args: IngestArgs) -> Result<()> {
    output::print_header("Log Batch Ingestion");

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

    let disposition = match args.post_process {
        PostProcessMode::Keep => Disposition::Keep,
        PostProcessMode::Delete => Disposition::Delete,
        PostProcessMode::Archive => {
            let archive = settings.archive_path(args.archive_path.as_deref());
            ensure_archive_dir(&archive)?;
            Disposition::Archive(archive)
        }
    };
    let timing = if args.deferred {
        TimingMode::Deferred
    } else {
        TimingMode::Immediate
    };

    // 命令行指定的处理器优先于配置文件
    let command = match (&args.processor, &settings.processor) {
        (Some(program), _) => Some(CommandProcessorFactory::new(
            program.clone(),
            args.processor_args.clone(),
        )),
        (None, Some(cfg)) => Some(CommandProcessorFactory::new(
            cfg.command.clone(),
            cfg.args.clone(),
        )),
        (None, None) => None,
    };
    let inspector = InspectProcessorFactory;
    let factory: &dyn ProcessorFactory = match &command {
        Some(command) => command,
        None => &inspector,
    };

    let locator = FileLocator::new(folder).with_extension(&extension);

    output::print_info(&format!(
        "File types: {} | folder: '{}' | extension: '.{}'",
        file_types.join(", "),
        locator.folder().display(),
        locator.extension()
    ));
    output::print_info(&format!(
        "Post-process: {}{} | timing: {:?} | batch size: {} | processor: {}",
        args.post_process,
        match &disposition {
            Disposition::Archive(dir) => format!(" -> '{}'", dir.display()),
            _ => String::new(),
        },
        timing,
        batch_size,
        factory.name()
    ));

    let progress_bar = if args.no_progress {
        indicatif::ProgressBar::hidden()
    } else {
        progress::create_progress_bar(0, "Processing")
    };

    let scheduler = BatchScheduler::new(factory, PostProcessor::new(disposition), timing)
        .with_batch_size(batch_size)
        .with_progress(progress_bar);

    let summary = scheduler.run(&locator, &file_types)?;
    print_summary(&summary);

    Ok(())
}

/// 创建归档目录
fn ensure_archive_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| LogBatchError::FileWriteError {
        path: dir.display().to_string(),
        source: e,
    })
}

/// 打印统计
fn print_summary(summary: &RunSummary) {
    output::print_separator();
    output::print_done(&format!(
        "Processed {} of {} discovered files in {} batches: {} succeeded, {} failed",
        summary.total(),
        summary.discovered,
        summary.batches,
        summary.succeeded,
        summary.failed
    ));
    if summary.deferred > 0 {
        output::print_info(&format!(
            "{} files were post-processed after the run",
            summary.deferred
        ));
    }
    output::print_info(&format!(
        "Post-processing: {} archived, {} deleted, {} kept",
        summary.archived, summary.deleted, summary.kept
    ));

    if !summary.failures.is_empty() {
        output::print_warning("Failed files (left in place):");
        for path in summary.failures.iter().take(MAX_LISTED_FAILURES) {
            output::print_error(&format!("  {}", path));
        }
        if summary.failures.len() > MAX_LISTED_FAILURES {
            output::print_warning(&format!(
                "  ... and {} more",
                summary.failures.len() - MAX_LISTED_FAILURES
            ));
        }
    }
}
