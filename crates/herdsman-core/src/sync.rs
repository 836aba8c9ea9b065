//! Cluster configuration update scheduling
//!
//! Requests are queued on an unbounded channel and drained by a single
//! worker task. Requests that arrive while an update is pending or running
//! are coalesced into at most one follow-up run.

use std::sync::Arc;
use std::time::Duration;

use herdsman_exec::{CommandExecutor, CommandResult};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument};

/// Receives requests to regenerate cluster-wide configuration
pub trait ClusterUpdateScheduler: Send + Sync {
    /// Queue an update; never blocks the caller
    fn schedule_cluster_update(&self, reason: &str);
}

/// Background worker that runs the cluster update command
#[derive(Debug, Clone)]
pub struct SyncManager {
    tx: mpsc::UnboundedSender<String>,
}

impl SyncManager {
    /// Spawn the worker task
    ///
    /// `command` is run through `executor` after `delay`; with no command
    /// configured, updates are only logged.
    pub fn spawn(
        executor: Arc<dyn CommandExecutor>,
        command: Option<String>,
        delay: Duration,
    ) -> (Self, JoinHandle<()>) {
        let (tx, rx) = mpsc::unbounded_channel();

        let worker = Worker {
            executor,
            command,
            delay,
        };
        let handle = tokio::spawn(worker.run(rx));

        (Self { tx }, handle)
    }
}

impl ClusterUpdateScheduler for SyncManager {
    fn schedule_cluster_update(&self, reason: &str) {
        if self.tx.send(reason.to_string()).is_err() {
            error!(reason, "cluster update worker is gone");
        }
    }
}

struct Worker {
    executor: Arc<dyn CommandExecutor>,
    command: Option<String>,
    delay: Duration,
}

impl Worker {
    async fn run(self, mut rx: mpsc::UnboundedReceiver<String>) {
        info!("cluster update worker started");

        while let Some(reason) = rx.recv().await {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }

            let mut reasons = vec![reason];
            while let Ok(reason) = rx.try_recv() {
                reasons.push(reason);
            }

            self.update(&reasons).await;
        }

        info!("cluster update worker stopped");
    }

    #[instrument(skip_all, fields(requests = reasons.len()))]
    async fn update(&self, reasons: &[String]) {
        let Some(command) = &self.command else {
            debug!(?reasons, "no cluster update command configured");
            return;
        };

        info!(?reasons, "updating cluster configuration");
        match self
            .executor
            .run(command)
            .await
            .and_then(CommandResult::into_result)
        {
            Ok(result) => debug!(duration = ?result.duration, "cluster update completed"),
            Err(e) => error!(error = %e, "error updating cluster configuration"),
        }
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use herdsman_exec::{CommandResult, ExecError};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct CountingExecutor {
        commands: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandExecutor for CountingExecutor {
        async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
            self.commands.lock().push(cmd.to_string());
            Ok(CommandResult {
                status: 0,
                stdout: String::new(),
                stderr: String::new(),
                duration: Duration::ZERO,
            })
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            _timeout: Duration,
        ) -> Result<CommandResult, ExecError> {
            self.run(cmd).await
        }

        fn executor_type(&self) -> &'static str {
            "counting"
        }
    }

    #[tokio::test]
    async fn test_requests_are_coalesced() {
        let executor = Arc::new(CountingExecutor::default());
        let (sync, handle) = SyncManager::spawn(
            executor.clone(),
            Some("/usr/bin/herdsman-genconfig".to_string()),
            Duration::from_millis(50),
        );

        sync.schedule_cluster_update("Node(s) added");
        sync.schedule_cluster_update("Node(s) deleted");
        sync.schedule_cluster_update("run post-install");
        drop(sync);
        handle.await.unwrap();

        assert_eq!(
            *executor.commands.lock(),
            vec!["/usr/bin/herdsman-genconfig".to_string()]
        );
    }

    #[tokio::test]
    async fn test_without_command_nothing_runs() {
        let executor = Arc::new(CountingExecutor::default());
        let (sync, handle) = SyncManager::spawn(executor.clone(), None, Duration::ZERO);

        sync.schedule_cluster_update("Node(s) added");
        drop(sync);
        handle.await.unwrap();

        assert!(executor.commands.lock().is_empty());
    }
}
