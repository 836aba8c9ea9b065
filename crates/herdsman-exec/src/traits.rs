//! Command executor trait

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ExecError;
use crate::result::CommandResult;

/// Something that can run a shell command and report its outcome
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run a command to completion
    async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError>;

    /// Run a command, giving up after `timeout`
    async fn run_with_timeout(
        &self,
        cmd: &str,
        timeout: Duration,
    ) -> Result<CommandResult, ExecError>;

    /// Short name for logging
    fn executor_type(&self) -> &'static str;
}
