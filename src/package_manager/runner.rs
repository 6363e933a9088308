//! 子进程执行

use super::types::{Capture, CommandOutput, Invocation};
use super::PipError;

/// 执行外部命令的抽象，测试中用 mock 替代
#[cfg_attr(test, mockall::automock)]
pub trait CommandRunner {
    /// 阻塞执行命令直到退出。非零退出码不视为错误，由调用方判断。
    fn run(&self, invocation: &Invocation, capture: Capture) -> Result<CommandOutput, PipError>;
}

/// 基于 duct 的真实实现
#[derive(Debug, Clone, Copy, Default)]
pub struct DuctRunner;

impl CommandRunner for DuctRunner {
    fn run(&self, invocation: &Invocation, capture: Capture) -> Result<CommandOutput, PipError> {
        log::debug!("执行: {}", invocation);

        let mut expr = duct::cmd(invocation.program.as_str(), &invocation.args).unchecked();
        for (key, value) in &invocation.envs {
            expr = expr.env(key, value);
        }
        expr = match capture {
            Capture::Inherit => expr,
            Capture::Stdout => expr.stdout_capture(),
            Capture::Stderr => expr.stderr_capture(),
            Capture::Both => expr.stdout_capture().stderr_capture(),
        };

        let output = expr.run().map_err(|source| PipError::Spawn {
            program: invocation.program.clone(),
            source,
        })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: output.status.code(),
        };
        log::debug!("退出码: {:?}", result.code);
        Ok(result)
    }
}
