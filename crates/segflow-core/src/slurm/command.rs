//! Bounded subprocess execution for scheduler commands

use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use crate::{Error, Result};

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs scheduler commands with a bounded timeout.
///
/// Command-not-found and timeout are transport failures and surface as
/// `Error::Scheduler`; a non-zero exit is a normal outcome the caller
/// interprets.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    timeout: Duration,
}

impl CommandRunner {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Execute a command, capturing stdout and stderr.
    pub async fn execute(&self, program: &str, args: &[&str]) -> Result<CommandOutput> {
        let child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    Error::scheduler(format!("Command not found: {}", program))
                } else {
                    Error::scheduler(format!("Failed to spawn {}: {}", program, e))
                }
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::scheduler(format!(
                    "Command timed out after {}s: {} {}",
                    self.timeout.as_secs(),
                    program,
                    args.join(" ")
                ))
            })?
            .map_err(|e| Error::scheduler(format!("Command execution failed: {}", e)))?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code().unwrap_or(-1),
        };

        debug!(
            "Command executed: {} {}, exit code: {}",
            program,
            args.join(" "),
            result.exit_code
        );

        Ok(result)
    }

    /// Execute a command and fail on non-zero exit.
    pub async fn execute_checked(&self, program: &str, args: &[&str]) -> Result<String> {
        let output = self.execute(program, args).await?;

        if !output.success() {
            return Err(Error::scheduler(format!(
                "Command failed with exit code {}: {} {}\nStderr: {}",
                output.exit_code,
                program,
                args.join(" "),
                output.stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_execute_captures_stdout() {
        let runner = CommandRunner::default();
        let output = runner.execute("echo", &["hello"]).await.unwrap();
        assert!(output.success());
        assert_eq!(output.stdout.trim(), "hello");
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_not_a_transport_error() {
        let runner = CommandRunner::default();
        let output = runner.execute("false", &[]).await.unwrap();
        assert!(!output.success());
        assert_eq!(output.exit_code, 1);
    }

    #[tokio::test]
    async fn test_missing_command_is_transport_error() {
        let runner = CommandRunner::default();
        let err = runner
            .execute("definitely-not-a-real-command-xyz", &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Scheduler(_)));
        assert!(err.to_string().contains("not found"));
    }

    #[tokio::test]
    async fn test_timeout_is_transport_error() {
        let runner = CommandRunner::new(Duration::from_millis(100));
        let err = runner.execute("sleep", &["5"]).await.unwrap_err();
        assert!(matches!(err, Error::Scheduler(_)));
        assert!(err.to_string().contains("timed out"));
    }

    #[tokio::test]
    async fn test_execute_checked_surfaces_stderr() {
        let runner = CommandRunner::default();
        let err = runner.execute_checked("false", &[]).await.unwrap_err();
        assert!(err.to_string().contains("exit code 1"));
    }
}
