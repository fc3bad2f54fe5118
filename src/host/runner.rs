// file: src/host/runner.rs
// version: 1.0.0
// guid: 31ebad22-173f-4d02-bbaf-5db58e102ca9

//! Shell command execution on the local host

use crate::{InstallerError, Result};
use std::process::Stdio;
use std::sync::Mutex;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info};

/// Captured result of one shell command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr, as it would appear on a terminal
    pub fn combined(&self) -> String {
        let mut text = self.stdout.clone();
        if !self.stderr.is_empty() {
            if !text.is_empty() && !text.ends_with('\n') {
                text.push('\n');
            }
            text.push_str(&self.stderr);
        }
        text
    }
}

/// Trait for executing shell commands on the node
#[async_trait::async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `command` through `bash -c`; a non-zero exit is not an error,
    /// an expired `timeout` is
    async fn run(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput>;
}

/// Runs commands on this machine
#[derive(Debug, Default, Clone)]
pub struct LocalRunner;

impl LocalRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl CommandRunner for LocalRunner {
    async fn run(&self, command: &str, timeout: Option<Duration>) -> Result<CommandOutput> {
        debug!("Executing local command: {}", command);

        let child = Command::new("bash")
            .arg("-c")
            .arg(command)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output();

        let output = match timeout {
            Some(limit) => tokio::time::timeout(limit, child)
                .await
                .map_err(|_| InstallerError::probe_timeout(command, limit))?,
            None => child.await,
        }
        .map_err(|e| InstallerError::execution(format!("Failed to execute '{}': {}", command, e)))?;

        let result = CommandOutput {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        debug!("Command exited with {}", result.exit_code);
        Ok(result)
    }
}

/// Records commands instead of executing them (`--dry-run`)
#[derive(Debug, Default)]
pub struct DryRunRunner {
    commands: Mutex<Vec<String>>,
}

impl DryRunRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every command seen so far, in order
    pub fn commands(&self) -> Vec<String> {
        self.commands
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl CommandRunner for DryRunRunner {
    async fn run(&self, command: &str, _timeout: Option<Duration>) -> Result<CommandOutput> {
        info!("[dry-run] {}", command);
        if let Ok(mut guard) = self.commands.lock() {
            guard.push(command.to_string());
        }
        Ok(CommandOutput {
            exit_code: 0,
            stdout: format!("[dry-run] {}\n", command),
            stderr: String::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_runner_captures_output_and_status() -> Result<()> {
        // Arrange
        let runner = LocalRunner::new();

        // Act
        let output = runner.run("echo out; echo err >&2; exit 3", None).await?;

        // Assert
        assert_eq!(output.exit_code, 3);
        assert_eq!(output.stdout, "out\n");
        assert_eq!(output.stderr, "err\n");
        assert_eq!(output.combined(), "out\nerr\n");
        assert!(!output.success());
        Ok(())
    }

    #[tokio::test]
    async fn test_local_runner_times_out() {
        let runner = LocalRunner::new();

        let err = runner
            .run("sleep 5", Some(Duration::from_millis(100)))
            .await
            .unwrap_err();

        assert!(matches!(err, InstallerError::ProbeTimeout { .. }));
    }

    #[tokio::test]
    async fn test_dry_run_records_commands() -> Result<()> {
        let runner = DryRunRunner::new();

        runner.run("apt-get install -y chrony", None).await?;
        runner.run("systemctl enable chrony", None).await?;

        assert_eq!(
            runner.commands(),
            vec!["apt-get install -y chrony".to_string(), "systemctl enable chrony".to_string()]
        );
        Ok(())
    }
}
