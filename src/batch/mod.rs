//! # 批量处理模块
//!
//! 日志文件批量导入的编排核心。
//!
//! ## 功能
//! - 按类型查找文件并按序号排序
//! - 固定大小分批，批内并发、批间串行
//! - 单文件处理与失败隔离
//! - 保留 / 归档 / 删除后处理，立即或延迟执行
//! - 延迟模式下的并发安全登记表
//!
//! ## 依赖关系
//! - 被 `commands/` 使用
//! - 使用 `processor/` 调用外部处理协议
//! - 使用 `rayon` 进行并行处理
//! - 使用 `indicatif` 显示进度

pub mod disposition;
pub mod locator;
pub mod registry;
pub mod scheduler;
pub mod worker;

pub use disposition::{Disposition, PostProcessor, TimingMode};
pub use locator::{FileLocator, DEFAULT_EXTENSION};
pub use scheduler::{plan_batches, BatchScheduler, RunSummary, DEFAULT_BATCH_SIZE};
