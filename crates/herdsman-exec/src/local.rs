//! Local command execution using `tokio::process`

use std::collections::BTreeMap;
use std::process::Stdio;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::{debug, instrument, warn};

use crate::error::ExecError;
use crate::result::CommandResult;
use crate::traits::CommandExecutor;

/// Runs commands on the installer node through `sh -c`
///
/// Every command inherits the executor's extra environment, which is how
/// hook scripts learn about the cluster (installer name, config root, ...).
#[derive(Debug, Clone, Default)]
pub struct LocalExecutor {
    env: BTreeMap<String, String>,
    default_timeout: Option<Duration>,
}

impl LocalExecutor {
    /// Create a new local executor
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Export an environment variable to every command
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Apply a timeout to [`CommandExecutor::run`]
    #[must_use]
    pub fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = Some(timeout);
        self
    }

    async fn execute(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        let start = Instant::now();

        let output = Command::new("sh")
            .arg("-c")
            .arg(cmd)
            .envs(&self.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ExecError::SpawnError(e.to_string()))?
            .wait_with_output()
            .await
            .map_err(|e| ExecError::IoError(e.to_string()))?;

        let result = CommandResult {
            status: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            duration: start.elapsed(),
        };

        if result.success() {
            debug!(command = %cmd, duration = ?result.duration, "command completed");
        } else {
            warn!(
                command = %cmd,
                status = result.status,
                stderr = %result.stderr.trim(),
                "command exited non-zero"
            );
        }

        Ok(result)
    }
}

#[async_trait]
impl CommandExecutor for LocalExecutor {
    #[instrument(skip(self), level = "debug")]
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
        match self.default_timeout {
            Some(limit) => self.run_with_timeout(cmd, limit).await,
            None => self.execute(cmd).await,
        }
    }

    #[instrument(skip(self), level = "debug")]
    async fn run_with_timeout(
        &self,
        cmd: &str,
        limit: Duration,
    ) -> Result<CommandResult, ExecError> {
        timeout(limit, self.execute(cmd)).await.map_err(|_| {
            warn!(command = %cmd, timeout = ?limit, "command timed out");
            ExecError::Timeout { timeout: limit }
        })?
    }

    fn executor_type(&self) -> &'static str {
        "local"
    }
}
