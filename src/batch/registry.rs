//! # 延迟后处理登记表
//!
//! 延迟模式下，成功处理的文件路径先登记在这里，全部批次结束后统一后处理。
//!
//! ## 依赖关系
//! - 被 `batch/worker.rs` 并发写入
//! - 被 `batch/scheduler.rs` 在所有批次结束后一次性取出

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

#[derive(Debug, Default)]
struct Entries {
    order: Vec<PathBuf>,
    seen: HashSet<PathBuf>,
}

/// 并发安全、只追加的路径登记表
#[derive(Debug, Default)]
pub struct DeferredRegistry {
    entries: Mutex<Entries>,
}

impl DeferredRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个路径；重复登记返回 `false` 且不会产生第二个条目
    pub fn record(&self, path: &Path) -> bool {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if !entries.seen.insert(path.to_path_buf()) {
            return false;
        }
        entries.order.push(path.to_path_buf());
        true
    }

    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .order
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取出全部条目（按登记顺序）。消耗登记表，之后不可能再有写入者。
    pub fn into_entries(self) -> Vec<PathBuf> {
        self.entries
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .order
    }
}
