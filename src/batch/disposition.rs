//! # 后处理器
//!
//! 对处理成功的文件执行后处理：保留、归档或删除。
//!
//! | 后处理 | 成功时 | 失败时 |
//! |---|---|---|
//! | Keep | 不动 | 不动 |
//! | Archive(dir) | 移动到 `dir/<文件名>` | 不动 |
//! | Delete | 删除 | 不动 |
//!
//! 失败的文件根本不会到达这里；归档目标已存在或文件系统操作失败都是致命错误。
//!
//! ## 依赖关系
//! - 被 `batch/worker.rs`（立即模式）和 `batch/scheduler.rs`（延迟模式）调用
//! - 使用 `utils/output.rs` 输出

use crate::error::{LogBatchError, Result};
use crate::utils::output;

use indicatif::ProgressBar;
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

/// 后处理方式（整次运行统一）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Keep,
    Archive(PathBuf),
    Delete,
}

/// 后处理时机
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimingMode {
    /// 每个文件处理成功后立即执行
    #[default]
    Immediate,
    /// 全部文件类型和批次结束后统一执行
    Deferred,
}

/// 单个文件实际执行的后处理动作
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispositionAction {
    Kept,
    Archived(PathBuf),
    Deleted,
}

/// 后处理器
#[derive(Debug, Clone)]
pub struct PostProcessor {
    disposition: Disposition,
}

impl PostProcessor {
    pub fn new(disposition: Disposition) -> Self {
        Self { disposition }
    }

    /// 对单个成功文件执行后处理
    pub fn apply(&self, file: &Path) -> Result<DispositionAction> {
        match &self.disposition {
            Disposition::Keep => Ok(DispositionAction::Kept),
            Disposition::Archive(dir) => {
                let target = archive_target(dir, file)?;
                move_file(file, &target)?;
                Ok(DispositionAction::Archived(target))
            }
            Disposition::Delete => {
                fs::remove_file(file).map_err(|e| LogBatchError::DispositionFailed {
                    action: "delete",
                    path: file.display().to_string(),
                    source: e,
                })?;
                Ok(DispositionAction::Deleted)
            }
        }
    }

    /// 按登记顺序对延迟登记的文件逐个执行后处理，遇到第一个错误即停止
    pub fn drain(
        &self,
        entries: Vec<PathBuf>,
        progress: &ProgressBar,
    ) -> Result<Vec<DispositionAction>> {
        let mut actions = Vec::with_capacity(entries.len());
        for file in entries {
            let action = self.apply(&file)?;
            progress.suspend(|| report_action(&file, &action));
            actions.push(action);
        }
        Ok(actions)
    }
}

/// 打印后处理结果
pub fn report_action(file: &Path, action: &DispositionAction) {
    match action {
        DispositionAction::Kept => {}
        DispositionAction::Archived(target) => output::print_transition(
            &file.display().to_string(),
            &target.display().to_string(),
        ),
        DispositionAction::Deleted => {
            output::print_success(&format!("Deleted file: {}", file.display()))
        }
    }
}

/// 计算归档目标路径，目标已存在时报错
fn archive_target(dir: &Path, file: &Path) -> Result<PathBuf> {
    let name = file.file_name().ok_or_else(|| {
        LogBatchError::InvalidArgument(format!("Not a file path: {}", file.display()))
    })?;
    let target = dir.join(name);

    if target.exists() {
        return Err(LogBatchError::ArchiveCollision {
            path: file.display().to_string(),
            target: target.display().to_string(),
        });
    }

    Ok(target)
}

/// 不覆盖地移动文件
///
/// 先尝试硬链接；跨文件系统等情况下退回到 `create_new` 复制。
/// 两条路径在目标已存在时都以 `AlreadyExists` 失败，因此检查之后出现的同名文件也不会被覆盖。
fn move_file(from: &Path, to: &Path) -> Result<()> {
    let failed = |source| LogBatchError::DispositionFailed {
        action: "archive",
        path: from.display().to_string(),
        source,
    };
    let collision = || LogBatchError::ArchiveCollision {
        path: from.display().to_string(),
        target: to.display().to_string(),
    };

    match fs::hard_link(from, to) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(collision()),
        Err(link_err) => {
            if !from.is_file() {
                return Err(failed(link_err));
            }
            match copy_new(from, to) {
                Ok(()) => {}
                Err(e) if e.kind() == ErrorKind::AlreadyExists => return Err(collision()),
                Err(e) => {
                    fs::remove_file(to).ok();
                    return Err(failed(e));
                }
            }
        }
    }

    if let Err(e) = fs::remove_file(from) {
        fs::remove_file(to).ok();
        return Err(failed(e));
    }

    Ok(())
}

/// 复制到一个必须尚不存在的目标
fn copy_new(from: &Path, to: &Path) -> io::Result<()> {
    let mut src = File::open(from)?;
    let mut dst = OpenOptions::new().write(true).create_new(true).open(to)?;
    io::copy(&mut src, &mut dst)?;
    dst.sync_all()
}
