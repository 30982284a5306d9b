//! # 内置检查处理器
//!
//! 未配置外部命令时使用：以 UTF-8 读取整个文件并统计非空行数。
//! 能完整读取即视为成功。

use super::{LogFileProcessor, ProcessorFactory};

use std::fs;
use std::path::Path;

/// 内置检查处理器工厂
#[derive(Debug, Clone, Copy, Default)]
pub struct InspectProcessorFactory;

impl ProcessorFactory for InspectProcessorFactory {
    fn create_scope(&self) -> Box<dyn LogFileProcessor + '_> {
        Box::new(InspectProcessor::default())
    }

    fn name(&self) -> String {
        "built-in inspector".to_string()
    }
}

/// 单次调用的检查处理器
#[derive(Debug, Default)]
pub struct InspectProcessor {
    records: usize,
    failure: Option<String>,
}

impl LogFileProcessor for InspectProcessor {
    fn process_log_file(&mut self, path: &Path) -> bool {
        match fs::read_to_string(path) {
            Ok(content) => {
                self.records = content.lines().filter(|l| !l.trim().is_empty()).count();
                true
            }
            Err(e) => {
                self.failure = Some(e.to_string());
                false
            }
        }
    }

    fn failure_reason(&self) -> Option<String> {
        self.failure.clone()
    }

    fn success_detail(&self) -> Option<String> {
        if self.failure.is_some() {
            return None;
        }
        Some(format!("{} records", self.records))
    }
}
