//! # 单文件处理单元
//!
//! 批次内的并发单位：调用外部处理协议，根据结果立即后处理或登记到延迟表。
//!
//! ## 依赖关系
//! - 被 `batch/scheduler.rs` 在 rayon 线程池中调用
//! - 使用 `processor/`、`batch/disposition.rs`、`batch/registry.rs`

use super::disposition::{report_action, DispositionAction, PostProcessor, TimingMode};
use super::locator::CandidateFile;
use super::registry::DeferredRegistry;
use crate::error::Result;
use crate::processor::ProcessorFactory;
use crate::utils::output;

use indicatif::ProgressBar;

/// 单个文件的处理结果（每个文件恰好一个，不重试）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
    pub file: CandidateFile,
    pub succeeded: bool,
    /// 立即模式下实际执行的后处理；失败或延迟模式下为 `None`
    pub action: Option<DispositionAction>,
    /// 延迟模式下是否新登记到延迟表
    pub deferred: bool,
}

/// 单文件处理单元
pub struct ProcessingWorker<'a> {
    pub(crate) factory: &'a dyn ProcessorFactory,
    pub(crate) post: &'a PostProcessor,
    pub(crate) timing: TimingMode,
    pub(crate) registry: &'a DeferredRegistry,
    pub(crate) progress: &'a ProgressBar,
}

impl ProcessingWorker<'_> {
    /// 处理一个文件
    ///
    /// 处理失败只输出诊断并返回失败结果；后处理失败返回错误。
    pub fn run(&self, file: &CandidateFile) -> Result<ProcessingOutcome> {
        self.progress
            .suspend(|| output::print_info(&format!("Processing file: {}", file.path.display())));

        let (succeeded, reason, detail) = {
            let mut processor = self.factory.create_scope();
            let ok = processor.process_log_file(&file.path);
            (ok, processor.failure_reason(), processor.success_detail())
        };

        let outcome = if !succeeded {
            self.progress.suspend(|| {
                let detail = reason.map(|r| format!(" ({})", r)).unwrap_or_default();
                output::print_warning(&format!(
                    "Processing failed for file: {}{}, skipping post-processing steps.",
                    file.path.display(),
                    detail
                ))
            });
            ProcessingOutcome {
                file: file.clone(),
                succeeded: false,
                action: None,
                deferred: false,
            }
        } else {
            if let Some(detail) = detail {
                self.progress.suspend(|| {
                    output::print_success(&format!(
                        "Processed file: {} ({})",
                        file.path.display(),
                        detail
                    ))
                });
            }
            match self.timing {
                TimingMode::Immediate => {
                    let action = self.post.apply(&file.path)?;
                    self.progress.suspend(|| report_action(&file.path, &action));
                    ProcessingOutcome {
                        file: file.clone(),
                        succeeded: true,
                        action: Some(action),
                        deferred: false,
                    }
                }
                TimingMode::Deferred => {
                    let recorded = self.registry.record(&file.path);
                    if recorded {
                        self.progress.suspend(|| {
                            output::print_skip(&format!(
                                "Deferred post-processing: {}",
                                file.path.display()
                            ))
                        });
                    }
                    ProcessingOutcome {
                        file: file.clone(),
                        succeeded: true,
                        action: None,
                        deferred: recorded,
                    }
                }
            }
        };

        self.progress.inc(1);
        Ok(outcome)
    }
}
