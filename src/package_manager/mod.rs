//! 包管理器模块 — 对 `python -m pip` 的封装

pub mod parser;
pub mod runner;
pub mod types;

// 重新导出常用类型
pub use runner::{CommandRunner, DuctRunner};
pub use types::{Capture, CommandOutput, Invocation, OutdatedPackage};

use crate::config::Config;
use std::collections::BTreeSet;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipError {
    #[error("无法启动 {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("命令执行失败 (退出码 {code:?}): {command}{}", format_stderr(.stderr))]
    CommandFailed {
        command: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("无法解析 pip 输出: {0}")]
    MalformedOutput(#[from] serde_json::Error),
}

fn format_stderr(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}

pub struct PackageManager<R: CommandRunner> {
    runner: R,
    python: String,
    envs: Vec<(String, String)>,
}

impl<R: CommandRunner> PackageManager<R> {
    pub fn new(runner: R, python: impl Into<String>) -> Self {
        Self {
            runner,
            python: python.into(),
            envs: Vec::new(),
        }
    }

    /// 按配置构建：解释器和传给 pip 的环境变量
    pub fn from_config(runner: R, config: &Config) -> Self {
        let mut pm = Self::new(runner, config.python.clone());
        for (key, value) in config.pip_env() {
            pm = pm.env(key, value);
        }
        pm
    }

    /// 追加一个传给每次 pip 调用的环境变量
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    fn pip<I, S>(&self, args: I) -> Invocation
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Invocation::new(self.python.clone())
            .args(["-m", "pip"])
            .args(args)
            .envs(&self.envs)
    }

    /// 执行命令，非零退出码视为失败
    fn run_checked(&self, invocation: Invocation, capture: Capture) -> Result<CommandOutput, PipError> {
        let output = self.runner.run(&invocation, capture)?;
        if !output.success {
            return Err(PipError::CommandFailed {
                command: invocation.to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// 获取过期包列表 (pip list --outdated --format=json)
    pub fn find_outdated(&self) -> Result<Vec<OutdatedPackage>, PipError> {
        let invocation = self.pip(["list", "--outdated", "--format=json"]);
        let output = self.run_checked(invocation, Capture::Stdout)?;
        Ok(parser::parse_outdated(&output.stdout)?)
    }

    /// 升级指定的包，stderr 被捕获用于冲突检测。列表为空时不执行任何命令。
    pub fn upgrade(&self, names: &[String]) -> Result<Option<CommandOutput>, PipError> {
        if names.is_empty() {
            return Ok(None);
        }
        let invocation = self.pip(["install", "--upgrade"]).args(names.iter().cloned());
        self.run_checked(invocation, Capture::Stderr).map(Some)
    }

    /// 强制重装指定的包，让 pip 重新解析出兼容的依赖版本
    pub fn force_reinstall(&self, names: &BTreeSet<String>) -> Result<(), PipError> {
        if names.is_empty() {
            return Ok(());
        }
        let invocation = self
            .pip(["install", "--force-reinstall"])
            .args(names.iter().cloned());
        self.run_checked(invocation, Capture::Inherit)?;
        Ok(())
    }

    /// 检查已安装包的依赖完整性 (pip check)
    ///
    /// 报告了问题时 pip check 以非零退出码结束，这里不视为错误；
    /// 非零退出且 stdout 为空说明 pip 本身出错。
    pub fn check(&self) -> Result<CommandOutput, PipError> {
        let invocation = self.pip(["check"]);
        let output = self.runner.run(&invocation, Capture::Both)?;
        if !output.success && output.stdout.trim().is_empty() {
            return Err(PipError::CommandFailed {
                command: invocation.to_string(),
                code: output.code,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// 安装指定的包
    pub fn install(&self, names: &BTreeSet<String>) -> Result<(), PipError> {
        if names.is_empty() {
            return Ok(());
        }
        let invocation = self.pip(["install"]).args(names.iter().cloned());
        self.run_checked(invocation, Capture::Inherit)?;
        Ok(())
    }

    /// 清空 pip 缓存 (pip cache purge)
    pub fn purge_cache(&self) -> Result<(), PipError> {
        self.run_checked(self.pip(["cache", "purge"]), Capture::Inherit)?;
        Ok(())
    }
}
