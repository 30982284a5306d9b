//! # 外部命令处理器
//!
//! 对每个文件调用一次外部解析程序，退出码 0 视为成功。
//!
//! ## 参数替换
//! - 参数中出现 `{}` 时替换为文件路径
//! - 否则把文件路径追加到参数末尾
//!
//! ## 依赖关系
//! - 被 `commands/ingest.rs` 构造
//! - 使用 `std::process::Command`

use super::{LogFileProcessor, ProcessorFactory};

use std::path::Path;
use std::process::{Command, Stdio};

/// 文件路径占位符
pub const PATH_PLACEHOLDER: &str = "{}";

/// stderr 只保留末尾若干行
const STDERR_TAIL_LINES: usize = 5;

/// 外部命令处理器工厂
#[derive(Debug, Clone)]
pub struct CommandProcessorFactory {
    program: String,
    args: Vec<String>,
}

impl CommandProcessorFactory {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    /// 构造某个文件对应的参数列表
    pub fn build_args(&self, path: &Path) -> Vec<String> {
        let path = path.display().to_string();
        if self.args.iter().any(|a| a == PATH_PLACEHOLDER) {
            self.args
                .iter()
                .map(|a| {
                    if a == PATH_PLACEHOLDER {
                        path.clone()
                    } else {
                        a.clone()
                    }
                })
                .collect()
        } else {
            let mut args = self.args.clone();
            args.push(path);
            args
        }
    }
}

impl ProcessorFactory for CommandProcessorFactory {
    fn create_scope(&self) -> Box<dyn LogFileProcessor + '_> {
        Box::new(CommandProcessor {
            factory: self,
            failure: None,
        })
    }

    fn name(&self) -> String {
        format!("command '{}'", self.program)
    }
}

/// 单次调用的外部命令处理器
pub struct CommandProcessor<'a> {
    factory: &'a CommandProcessorFactory,
    failure: Option<String>,
}

impl LogFileProcessor for CommandProcessor<'_> {
    fn process_log_file(&mut self, path: &Path) -> bool {
        let output = Command::new(&self.factory.program)
            .args(self.factory.build_args(path))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output();

        match output {
            Ok(out) if out.status.success() => true,
            Ok(out) => {
                let stderr = String::from_utf8_lossy(&out.stderr);
                let tail: Vec<&str> = stderr
                    .lines()
                    .rev()
                    .take(STDERR_TAIL_LINES)
                    .collect::<Vec<_>>()
                    .into_iter()
                    .rev()
                    .collect();
                self.failure = Some(format!("{} {}", out.status, tail.join(" | ")).trim().to_string());
                false
            }
            Err(e) => {
                self.failure = Some(format!("failed to run '{}': {}", self.factory.program, e));
                false
            }
        }
    }

    fn failure_reason(&self) -> Option<String> {
        self.failure.clone()
    }
}
