//! # 批次调度器
//!
//! 将有序文件序列切分为固定大小的批次：批次内并发，批次间串行。
//!
//! ## 功能
//! - 基于 rayon 线程池的批内并发（线程数 = 批次大小）
//! - 批次屏障：第 N 批全部完成（含立即模式下的后处理）后才开始第 N+1 批
//! - 多个文件类型按给定顺序依次处理
//! - 延迟模式下，全部结束后统一执行后处理
//! - 结果统计
//!
//! ## 依赖关系
//! - 被 `commands/ingest.rs` 调用
//! - 使用 `batch/locator.rs`、`batch/worker.rs`、`batch/disposition.rs`、`batch/registry.rs`
//! - 使用 `rayon` 进行并行处理

use super::disposition::{DispositionAction, PostProcessor, TimingMode};
use super::locator::{CandidateFile, FileLocator};
use super::registry::DeferredRegistry;
use super::worker::{ProcessingOutcome, ProcessingWorker};
use crate::error::{LogBatchError, Result};
use crate::processor::ProcessorFactory;
use crate::utils::output;

use indicatif::ProgressBar;
use rayon::prelude::*;
use std::collections::HashSet;

/// 默认批次大小
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// 一个批次（长度不超过批次大小，最后一批可能更短）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    /// 批次序号（从 1 开始）
    pub index: usize,
    pub files: Vec<CandidateFile>,
}

/// 按顺序切分批次
pub fn plan_batches(files: Vec<CandidateFile>, batch_size: usize) -> Result<Vec<Batch>> {
    if batch_size == 0 {
        return Err(LogBatchError::InvalidArgument(
            "Batch size must be at least 1".to_string(),
        ));
    }

    Ok(files
        .chunks(batch_size)
        .enumerate()
        .map(|(i, chunk)| Batch {
            index: i + 1,
            files: chunk.to_vec(),
        })
        .collect())
}

/// 运行结果统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// 发现的文件数
    pub discovered: usize,
    /// 执行的批次数
    pub batches: usize,
    /// 处理成功数
    pub succeeded: usize,
    /// 处理失败数
    pub failed: usize,
    /// 归档数
    pub archived: usize,
    /// 删除数
    pub deleted: usize,
    /// 保留数
    pub kept: usize,
    /// 延迟登记数
    pub deferred: usize,
    /// 处理失败的文件
    pub failures: Vec<String>,
}

impl RunSummary {
    /// 合并单个文件的处理结果
    pub fn merge(&mut self, outcome: &ProcessingOutcome) {
        if outcome.succeeded {
            self.succeeded += 1;
        } else {
            self.failed += 1;
            self.failures.push(outcome.file.path.display().to_string());
        }
        if let Some(action) = &outcome.action {
            self.count_action(action);
        }
        if outcome.deferred {
            self.deferred += 1;
        }
    }

    /// 计入一次后处理动作
    pub fn count_action(&mut self, action: &DispositionAction) {
        match action {
            DispositionAction::Kept => self.kept += 1,
            DispositionAction::Archived(_) => self.archived += 1,
            DispositionAction::Deleted => self.deleted += 1,
        }
    }

    /// 总处理数量
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}

/// 批次调度器
pub struct BatchScheduler<'a> {
    factory: &'a dyn ProcessorFactory,
    post: PostProcessor,
    timing: TimingMode,
    batch_size: usize,
    progress: ProgressBar,
}

impl<'a> BatchScheduler<'a> {
    /// 创建新的调度器（默认批次大小 5，不显示进度条）
    pub fn new(factory: &'a dyn ProcessorFactory, post: PostProcessor, timing: TimingMode) -> Self {
        Self {
            factory,
            post,
            timing,
            batch_size: DEFAULT_BATCH_SIZE,
            progress: ProgressBar::hidden(),
        }
    }

    /// 设置批次大小
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// 设置进度条
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = progress;
        self
    }

    /// 依次处理每个文件类型；延迟模式下最后统一后处理
    ///
    /// 重复的文件类型只处理第一次出现的那个。
    pub fn run(&self, locator: &FileLocator, file_types: &[String]) -> Result<RunSummary> {
        if self.batch_size == 0 {
            return Err(LogBatchError::InvalidArgument(
                "Batch size must be at least 1".to_string(),
            ));
        }

        // 线程数等于批次大小：一个批次的所有文件同时在跑
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.batch_size)
            .build()
            .map_err(|e| LogBatchError::WorkerPool(e.to_string()))?;

        let registry = DeferredRegistry::new();
        let mut summary = RunSummary::default();

        let mut seen = HashSet::new();
        for file_type in file_types {
            if !seen.insert(file_type.as_str()) {
                continue;
            }
            let files = locator.locate(file_type)?;
            if files.is_empty() {
                self.progress.suspend(|| {
                    output::print_warning(&format!(
                        "No '{}' files found in '{}'",
                        file_type,
                        locator.folder().display()
                    ))
                });
                continue;
            }

            self.progress.suspend(|| {
                output::print_info(&format!("Found {} '{}' files", files.len(), file_type))
            });
            self.progress.set_length(files.len() as u64);
            self.progress.set_position(0);
            self.progress.set_message(file_type.clone());

            summary.discovered += files.len();
            self.run_batches(&pool, files, &registry, &mut summary)?;
        }

        self.progress.finish_and_clear();

        if self.timing == TimingMode::Deferred {
            if registry.is_empty() {
                output::print_info("No files awaiting deferred post-processing");
            } else {
                output::print_info(&format!(
                    "Applying deferred post-processing to {} files",
                    registry.len()
                ));
            }
            let entries = registry.into_entries();
            for action in self.post.drain(entries, &self.progress)? {
                summary.count_action(&action);
            }
        }

        Ok(summary)
    }

    /// 按批次处理一个有序文件序列
    fn run_batches(
        &self,
        pool: &rayon::ThreadPool,
        files: Vec<CandidateFile>,
        registry: &DeferredRegistry,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let worker = ProcessingWorker {
            factory: self.factory,
            post: &self.post,
            timing: self.timing,
            registry,
            progress: &self.progress,
        };

        for batch in plan_batches(files, self.batch_size)? {
            // 屏障：collect 返回时本批次所有任务都已结束
            let results: Vec<Result<ProcessingOutcome>> = pool.install(|| {
                batch
                    .files
                    .par_iter()
                    .with_max_len(1)
                    .map(|file| worker.run(file))
                    .collect()
            });
            summary.batches += 1;

            let mut first_error = None;
            for result in results {
                match result {
                    Ok(outcome) => {
                        summary.merge(&outcome);
                    }
                    Err(e) => {
                        if first_error.is_none() {
                            first_error = Some(e);
                        }
                    }
                }
            }

            if let Some(e) = first_error {
                return Err(e);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::disposition::Disposition;
    use crate::processor::LogFileProcessor;
    use std::collections::{HashMap, HashSet};
    use std::fs;
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};
    use tempfile::TempDir;

    /// 处理事件：文件名、开始时间、结束时间
    #[derive(Debug, Clone)]
    struct Event {
        name: String,
        start: Instant,
        end: Instant,
    }

    /// 可编排的处理器：指定失败文件与每个文件的耗时，并记录时间戳
    #[derive(Default)]
    struct ScriptedFactory {
        fail: HashSet<String>,
        delays: HashMap<String, Duration>,
        events: Mutex<Vec<Event>>,
        /// 设置后，每次处理开始时记录该目录下现有的文件名
        watch_dir: Option<PathBuf>,
        snapshots: Mutex<Vec<(String, HashSet<String>)>>,
    }

    impl ScriptedFactory {
        fn failing(names: &[&str]) -> Self {
            Self {
                fail: names.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        fn events(&self) -> Vec<Event> {
            self.events.lock().unwrap().clone()
        }

        fn snapshots(&self) -> Vec<(String, HashSet<String>)> {
            self.snapshots.lock().unwrap().clone()
        }
    }

    struct ScriptedProcessor<'a> {
        factory: &'a ScriptedFactory,
    }

    impl LogFileProcessor for ScriptedProcessor<'_> {
        fn process_log_file(&mut self, path: &Path) -> bool {
            let name = path.file_name().unwrap().to_string_lossy().to_string();
            let start = Instant::now();
            if let Some(dir) = &self.factory.watch_dir {
                let present = fs::read_dir(dir)
                    .unwrap()
                    .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
                    .collect();
                self.factory.snapshots.lock().unwrap().push((name.clone(), present));
            }
            let delay = self
                .factory
                .delays
                .get(&name)
                .copied()
                .unwrap_or(Duration::from_millis(5));
            thread::sleep(delay);
            let ok = !self.factory.fail.contains(&name);
            self.factory.events.lock().unwrap().push(Event {
                name,
                start,
                end: Instant::now(),
            });
            ok
        }
    }

    impl ProcessorFactory for ScriptedFactory {
        fn create_scope(&self) -> Box<dyn LogFileProcessor + '_> {
            Box::new(ScriptedProcessor { factory: self })
        }

        fn name(&self) -> String {
            "scripted".to_string()
        }
    }

    fn candidates(n: u64) -> Vec<CandidateFile> {
        (1..=n)
            .map(|i| CandidateFile {
                path: PathBuf::from(format!("smtp_{}.txt", i)),
                order_key: i,
            })
            .collect()
    }

    fn write_logs(dir: &Path, tag: &str, n: u64) {
        for i in 1..=n {
            fs::write(dir.join(format!("{}_{}.txt", tag, i)), format!("{} log {}\n", tag, i))
                .unwrap();
        }
    }

    fn order_key_of(name: &str) -> u64 {
        name.trim_end_matches(".txt")
            .rsplit('_')
            .next()
            .unwrap()
            .parse()
            .unwrap()
    }

    #[test]
    fn test_plan_batch_sizes() {
        for len in 0..=23u64 {
            let batches = plan_batches(candidates(len), 5).unwrap();
            assert_eq!(batches.len(), (len as usize).div_ceil(5));
            if let Some((last, rest)) = batches.split_last() {
                assert!(rest.iter().all(|b| b.files.len() == 5));
                let expected = if len % 5 == 0 { 5 } else { (len % 5) as usize };
                assert_eq!(last.files.len(), expected);
            }
        }
    }

    #[test]
    fn test_plan_preserves_order() {
        let batches = plan_batches(candidates(12), 5).unwrap();
        let keys: Vec<Vec<u64>> = batches
            .iter()
            .map(|b| b.files.iter().map(|f| f.order_key).collect())
            .collect();
        assert_eq!(
            keys,
            vec![vec![1, 2, 3, 4, 5], vec![6, 7, 8, 9, 10], vec![11, 12]]
        );
        assert_eq!(batches[2].index, 3);
    }

    #[test]
    fn test_plan_rejects_zero_batch_size() {
        assert!(plan_batches(candidates(3), 0).is_err());
    }

    #[test]
    fn test_batch_barrier() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 12);

        let mut factory = ScriptedFactory::default();
        // 每批都有一个慢文件
        for slow in ["smtp_2.txt", "smtp_9.txt"] {
            factory
                .delays
                .insert(slow.to_string(), Duration::from_millis(80));
        }

        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Keep),
            TimingMode::Immediate,
        );
        let summary = scheduler
            .run(&FileLocator::new(dir.path()), &["smtp".to_string()])
            .unwrap();

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.succeeded, 12);
        assert_eq!(summary.kept, 12);

        let events = factory.events();
        assert_eq!(events.len(), 12);
        let batch_of = |e: &Event| (order_key_of(&e.name) - 1) / 5;
        for k in 0..2 {
            let last_end = events
                .iter()
                .filter(|e| batch_of(*e) == k)
                .map(|e| e.end)
                .max()
                .unwrap();
            let next_start = events
                .iter()
                .filter(|e| batch_of(*e) == k + 1)
                .map(|e| e.start)
                .min()
                .unwrap();
            assert!(last_end <= next_start, "batch {} overlapped batch {}", k + 2, k + 1);
        }
    }

    #[test]
    fn test_archive_immediate_end_to_end() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("logs");
        let archive = dir.path().join("archive");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&archive).unwrap();
        write_logs(&source, "smtp", 12);

        let factory = ScriptedFactory {
            watch_dir: Some(source.clone()),
            ..Default::default()
        };
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Archive(archive.clone())),
            TimingMode::Immediate,
        );
        let summary = scheduler
            .run(&FileLocator::new(&source), &["smtp".to_string()])
            .unwrap();

        assert_eq!(summary.batches, 3);
        assert_eq!(summary.archived, 12);
        for i in 1..=12 {
            let name = format!("smtp_{}.txt", i);
            assert!(!source.join(&name).exists());
            assert_eq!(
                fs::read_to_string(archive.join(&name)).unwrap(),
                format!("smtp log {}\n", i)
            );
        }

        // 后一批的任何文件开始处理时，前面批次的文件都已归档
        for (name, present) in factory.snapshots() {
            let batch = (order_key_of(&name) - 1) / 5;
            for earlier in 1..=(batch * 5) {
                assert!(
                    !present.contains(&format!("smtp_{}.txt", earlier)),
                    "{} started before smtp_{}.txt was archived",
                    name,
                    earlier
                );
            }
        }
    }

    #[test]
    fn test_delete_deferred_end_to_end() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 12);
        let original_7 = fs::read(dir.path().join("smtp_7.txt")).unwrap();

        let factory = ScriptedFactory {
            watch_dir: Some(dir.path().to_path_buf()),
            ..ScriptedFactory::failing(&["smtp_7.txt"])
        };
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Delete),
            TimingMode::Deferred,
        );
        let summary = scheduler
            .run(&FileLocator::new(dir.path()), &["smtp".to_string()])
            .unwrap();

        // 所有文件都尝试处理之前没有任何文件被删除
        let snapshots = factory.snapshots();
        assert_eq!(snapshots.len(), 12);
        assert!(snapshots.iter().all(|(_, present)| present.len() == 12));

        assert_eq!(summary.succeeded, 11);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.deferred, 11);
        assert_eq!(summary.deleted, 11);

        let remaining: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(remaining, vec!["smtp_7.txt".to_string()]);
        assert_eq!(fs::read(dir.path().join("smtp_7.txt")).unwrap(), original_7);
    }

    #[test]
    fn test_deferred_staggered_completion_registers_all() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 5);

        let mut factory = ScriptedFactory::default();
        // 完成顺序与发现顺序相反
        for i in 1..=5u64 {
            factory.delays.insert(
                format!("smtp_{}.txt", i),
                Duration::from_millis(10 * (6 - i)),
            );
        }

        let archive = dir.path().join("archive");
        fs::create_dir(&archive).unwrap();
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Archive(archive.clone())),
            TimingMode::Deferred,
        );
        let summary = scheduler
            .run(&FileLocator::new(dir.path()), &["smtp".to_string()])
            .unwrap();

        assert_eq!(summary.deferred, 5);
        assert_eq!(summary.archived, 5);
        let archived: HashSet<String> = fs::read_dir(&archive)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(archived.len(), 5);
    }

    #[test]
    fn test_failure_does_not_abort_siblings() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 7);

        let factory = ScriptedFactory::failing(&["smtp_1.txt", "smtp_6.txt"]);
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Delete),
            TimingMode::Immediate,
        );
        let summary = scheduler
            .run(&FileLocator::new(dir.path()), &["smtp".to_string()])
            .unwrap();

        assert_eq!(summary.total(), 7);
        assert_eq!(summary.failed, 2);
        assert_eq!(summary.deleted, 5);
        assert!(dir.path().join("smtp_1.txt").exists());
        assert!(dir.path().join("smtp_6.txt").exists());
        assert!(!dir.path().join("smtp_2.txt").exists());
    }

    #[test]
    fn test_disposition_error_aborts_remaining_batches() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("logs");
        let archive = dir.path().join("archive");
        fs::create_dir_all(&source).unwrap();
        fs::create_dir_all(&archive).unwrap();
        write_logs(&source, "smtp", 8);
        write_logs(&source, "pop3", 2);
        fs::write(archive.join("smtp_3.txt"), "already archived").unwrap();

        let factory = ScriptedFactory::default();
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Archive(archive.clone())),
            TimingMode::Immediate,
        );
        let err = scheduler
            .run(
                &FileLocator::new(&source),
                &["smtp".to_string(), "pop3".to_string()],
            )
            .unwrap_err();

        assert!(matches!(err, LogBatchError::ArchiveCollision { .. }));
        // 同批次的其他文件照常完成
        let processed: HashSet<String> = factory.events().into_iter().map(|e| e.name).collect();
        for i in 1..=5 {
            assert!(processed.contains(&format!("smtp_{}.txt", i)));
        }
        assert!(archive.join("smtp_5.txt").exists());
        // 后续批次与后续类型都未开始
        assert!(!processed.contains("smtp_6.txt"));
        assert!(!processed.contains("pop3_1.txt"));
        assert!(source.join("smtp_3.txt").exists());
        assert!(source.join("smtp_6.txt").exists());
    }

    #[test]
    fn test_file_types_run_in_order() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 3);
        write_logs(dir.path(), "pop3", 3);

        let factory = ScriptedFactory::default();
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Keep),
            TimingMode::Immediate,
        )
        .with_batch_size(2);
        let summary = scheduler
            .run(
                &FileLocator::new(dir.path()),
                &["pop3".to_string(), "imap".to_string(), "smtp".to_string()],
            )
            .unwrap();

        assert_eq!(summary.discovered, 6);
        assert_eq!(summary.batches, 4);

        let events = factory.events();
        let last_pop3 = events
            .iter()
            .filter(|e| e.name.starts_with("pop3"))
            .map(|e| e.end)
            .max()
            .unwrap();
        let first_smtp = events
            .iter()
            .filter(|e| e.name.starts_with("smtp"))
            .map(|e| e.start)
            .min()
            .unwrap();
        assert!(last_pop3 <= first_smtp);
    }

    #[test]
    fn test_repeated_file_type_runs_once() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 3);

        let factory = ScriptedFactory::default();
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Delete),
            TimingMode::Deferred,
        );
        let summary = scheduler
            .run(
                &FileLocator::new(dir.path()),
                &["smtp".to_string(), "smtp".to_string()],
            )
            .unwrap();

        assert_eq!(factory.events().len(), 3);
        assert_eq!(summary.discovered, 3);
        assert_eq!(summary.succeeded, 3);
        assert_eq!(summary.deferred, 3);
        assert_eq!(summary.deleted, 3);
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_discovery_error_is_fatal() {
        let dir = TempDir::new().unwrap();
        write_logs(dir.path(), "smtp", 2);
        fs::write(dir.path().join("smtp_old.txt"), "x").unwrap();

        let factory = ScriptedFactory::default();
        let scheduler = BatchScheduler::new(
            &factory,
            PostProcessor::new(Disposition::Delete),
            TimingMode::Immediate,
        );
        let err = scheduler
            .run(&FileLocator::new(dir.path()), &["smtp".to_string()])
            .unwrap_err();

        assert!(matches!(err, LogBatchError::InvalidOrderKey { .. }));
        assert!(factory.events().is_empty());
        assert!(dir.path().join("smtp_1.txt").exists());
    }
}
