//! # 统一错误处理模块
//!
//! 定义 logbatch 的所有错误类型，使用 `thiserror` 派生。
//!
//! ## 错误分级
//! - 发现错误（文件名序号无法解析）：致命，终止本次运行
//! - 处理失败：不是错误，由 worker 记录后吸收
//! - 后处理错误（归档/删除失败）：致命，穿过批次屏障向上传播
//!
//! ## 依赖关系
//! - 被所有其他模块使用
//! - 无外部模块依赖

use thiserror::Error;

/// 文件名序号解析失败的具体原因
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderKeyError {
    #[error("file name does not start with '{0}_'")]
    MissingPrefix(String),

    #[error("file name does not end with '.{0}'")]
    MissingExtension(String),

    #[error("numeric suffix is empty")]
    Empty,

    #[error("numeric suffix contains non-digit character '{0}'")]
    NonDigit(char),

    #[error("numeric suffix does not fit in 64 bits")]
    Overflow,
}

/// logbatch 统一错误类型
#[derive(Error, Debug)]
pub enum LogBatchError {
    // ─────────────────────────────────────────────────────────────
    // I/O 错误
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to read file: {path}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file: {path}")]
    FileWriteError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Directory not found: {path}")]
    DirectoryNotFound { path: String },

    // ─────────────────────────────────────────────────────────────
    // 发现错误
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid order key in file name: {path}")]
    InvalidOrderKey {
        path: String,
        #[source]
        source: OrderKeyError,
    },

    // ─────────────────────────────────────────────────────────────
    // 后处理错误
    // ─────────────────────────────────────────────────────────────
    #[error("Archive target already exists: {target} (source: {path})")]
    ArchiveCollision { path: String, target: String },

    #[error("Failed to {action} file: {path}")]
    DispositionFailed {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────
    // 配置与参数错误
    // ─────────────────────────────────────────────────────────────
    #[error("Settings file not found: {path}")]
    ConfigNotFound { path: String },

    #[error("Failed to parse settings file: {path}")]
    ConfigParseError {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // ─────────────────────────────────────────────────────────────
    // 其他
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to start worker pool: {0}")]
    WorkerPool(String),
}

/// Result 类型别名
pub type Result<T> = std::result::Result<T, LogBatchError>;
