//! Command execution: spawning the external tool and mapping its exit status.
//!
//! The child inherits stdout/stderr so the CI log shows the tool's output
//! directly; nothing is captured or parsed here.

use super::command::ShellCommand;
use crate::error::RunError;
use futures::future::{BoxFuture, FutureExt};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Runs one external command to completion in a working directory.
pub trait CommandRunner: Send + Sync {
    fn run<'a>(
        &'a self,
        command: &'a ShellCommand,
        cwd: &'a Path,
    ) -> BoxFuture<'a, Result<(), RunError>>;
}

/// Production runner: `sh -c <command>` with inherited standard streams.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: PathBuf,
}

impl ShellRunner {
    pub fn new() -> Self {
        ShellRunner {
            shell: PathBuf::from("sh"),
        }
    }

    /// Use a different POSIX shell binary.
    pub fn with_shell(shell: impl Into<PathBuf>) -> Self {
        ShellRunner {
            shell: shell.into(),
        }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandRunner for ShellRunner {
    fn run<'a>(
        &'a self,
        command: &'a ShellCommand,
        cwd: &'a Path,
    ) -> BoxFuture<'a, Result<(), RunError>> {
        async move {
            let line = command.render();
            // Our own protocol lines must reach the log before the child's output.
            let _ = std::io::stdout().flush();

            log::debug!("[Executor] Spawning in {}: {}", cwd.display(), line);
            for (key, value) in &command.env {
                log::debug!("[Executor] [ENV] {}={}", key, value);
            }

            let status = tokio::process::Command::new(&self.shell)
                .arg("-c")
                .arg(command.shell_line())
                .current_dir(cwd)
                .envs(&command.env)
                .stdin(std::process::Stdio::null())
                .stdout(std::process::Stdio::inherit())
                .stderr(std::process::Stdio::inherit())
                .status()
                .await
                .map_err(|source| RunError::Spawn {
                    command: line.clone(),
                    source,
                })?;

            if status.success() {
                log::debug!("[Executor] Command finished successfully: {}", line);
                Ok(())
            } else {
                log::warn!("[Executor] Command failed with {}: {}", status, line);
                Err(RunError::ExitStatus {
                    command: line,
                    code: status.code(),
                })
            }
        }
        .boxed()
    }
}

/// Logs each command and reports success without spawning anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct DryRunRunner;

impl CommandRunner for DryRunRunner {
    fn run<'a>(
        &'a self,
        command: &'a ShellCommand,
        cwd: &'a Path,
    ) -> BoxFuture<'a, Result<(), RunError>> {
        async move {
            log::info!(
                "[Executor] [DRY-RUN] Would run in {}: {}",
                cwd.display(),
                command.render()
            );
            Ok(())
        }
        .boxed()
    }
}
