//! Pre/post upload hook commands

use std::process::Stdio;
use std::sync::Arc;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info};

use crate::observability::{Metrics, UploadObserver};

#[derive(Debug, Error)]
pub enum HookError {
    #[error("Command `{command}' returned an error: {stderr} [err={code}]")]
    Failed {
        command: String,
        stderr: String,
        code: i32,
    },

    #[error("failed to run `{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Captured result of one hook invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HookOutput {
    pub command: String,
    pub stdout: String,
    pub stderr: String,
    /// Exit code; `-1` when the process was killed by a signal
    pub code: i32,
}

/// Runs operator-configured commands through the shell, one at a time
#[derive(Clone)]
pub struct HookRunner {
    observer: Arc<dyn UploadObserver>,
    metrics: Arc<Metrics>,
}

impl HookRunner {
    pub fn new(observer: Arc<dyn UploadObserver>, metrics: Arc<Metrics>) -> Self {
        Self { observer, metrics }
    }

    /// Run a configured hook; `None` or an empty command is a no-op
    pub async fn run_hook(
        &self,
        hook: &str,
        command: Option<&str>,
    ) -> Result<Option<HookOutput>, HookError> {
        match command.map(str::trim).filter(|c| !c.is_empty()) {
            Some(command) => {
                info!(hook, command, "Running hook");
                self.run(command).await.map(Some)
            }
            None => {
                debug!(hook, "No hook configured, skipping");
                Ok(None)
            }
        }
    }

    /// Run `command` to completion
    ///
    /// Stdout goes to the observer whatever the outcome. A non-zero exit
    /// becomes [`HookError::Failed`] carrying the captured stderr.
    pub async fn run(&self, command: &str) -> Result<HookOutput, HookError> {
        self.metrics.hook_run();

        let output = shell(command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|source| HookError::Spawn {
                command: command.to_string(),
                source,
            })?;

        let result = HookOutput {
            command: command.to_string(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code().unwrap_or(-1),
        };

        if !result.stdout.is_empty() {
            self.observer.hook_output(command, &result.stdout);
        }

        if !output.status.success() {
            return Err(HookError::Failed {
                command: result.command,
                stderr: result.stderr,
                code: result.code,
            });
        }

        debug!(command, "Hook finished");
        Ok(result)
    }
}

#[cfg(unix)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

#[cfg(not(unix))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}
