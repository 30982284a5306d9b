//! # 外部处理协议
//!
//! 单个日志文件的解析与入库不属于本工具的职责，这里只定义边界：
//! 给一个路径，返回是否处理成功。
//!
//! ## 隔离
//! 每次处理都通过 `ProcessorFactory::create_scope` 得到一个全新的处理器实例，
//! 同一批次内并发执行的文件之间不共享任何处理器状态。
//!
//! ## 依赖关系
//! - 被 `batch/worker.rs` 调用
//! - 被 `commands/ingest.rs` 构造
//! - 子模块: command, inspect

pub mod command;
pub mod inspect;

pub use command::CommandProcessorFactory;
pub use inspect::InspectProcessorFactory;

use std::path::Path;

/// 单文件处理协议
pub trait LogFileProcessor {
    /// 处理一个日志文件，返回是否成功。内部是否重试对调用方不可见。
    fn process_log_file(&mut self, path: &Path) -> bool;

    /// 最近一次失败的原因（如有）
    fn failure_reason(&self) -> Option<String> {
        None
    }

    /// 成功时附带的简要说明（如记录数）
    fn success_detail(&self) -> Option<String> {
        None
    }
}

/// 为每次处理创建独立的处理器实例
pub trait ProcessorFactory: Sync {
    fn create_scope(&self) -> Box<dyn LogFileProcessor + '_>;

    /// 处理器名称（用于输出）
    fn name(&self) -> String;
}
