//! System command execution
//!
//! Tools never look at process handles directly; they go through a
//! [`CommandRunner`] so the invokers can be driven by canned output in tests.

use crate::error::{AppError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::process::Command;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg<S: Into<String>>(mut self, arg: S) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Shell-like rendering for logs
    pub fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished command
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// stdout followed by stderr
    pub output: String,
    /// Exit status; `-1` when the process was terminated by a signal
    pub return_code: i32,
    pub duration: Duration,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.return_code == 0
    }
}

/// Runs commands to completion and captures their output
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command. A non-zero exit is data, not an error; only a
    /// failure to start the process is reported as `Err`.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as real child processes
#[derive(Debug, Default, Clone)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        let started = Instant::now();

        let output = Command::new(&spec.program)
            .args(&spec.args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::command_execution(format!("Failed to execute '{}': {}", spec.display(), e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(CommandOutput {
            output: combined,
            return_code: output.status.code().unwrap_or(-1),
            duration: started.elapsed(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_spec_display() {
        let spec = CommandSpec::new("ping").arg("-c").arg("1").arg("example.com");
        assert_eq!(spec.display(), "ping -c 1 example.com");
        assert_eq!(spec.args.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_binary_is_command_error() {
        let runner = SystemCommandRunner::new();
        let spec = CommandSpec::new("definitely-not-a-real-binary-4f1c");

        let err = runner.run(&spec).await.unwrap_err();
        assert_eq!(err.category(), "COMMAND");
        assert!(err.to_string().contains("definitely-not-a-real-binary-4f1c"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_captured() {
        let runner = SystemCommandRunner::new();
        let spec = CommandSpec::new("sh").arg("-c").arg("echo out; echo err 1>&2; exit 3");

        let output = runner.run(&spec).await.unwrap();
        assert_eq!(output.return_code, 3);
        assert!(!output.success());
        assert!(output.output.contains("out"));
        assert!(output.output.contains("err"));
    }
}
