//! Boot configuration and node cleanup hooks

use std::sync::Arc;

use async_trait::async_trait;
use herdsman_api::BootFrom;
use herdsman_db::Node;
use herdsman_exec::{CommandExecutor, CommandResult};
use tracing::{debug, instrument, warn};

use crate::config::CoreConfig;

/// Manages the boot configuration and site artifacts of nodes
#[async_trait]
pub trait BootHostManager: Send + Sync {
    /// Mark a node for network boot (reinstall) on its next restart
    async fn set_node_for_network_boot(&self, node: &mut Node);

    /// Write the PXE configuration of a node
    async fn write_boot_config(&self, node: &Node, local_boot: bool);

    /// Revoke the node's configuration-management certificate
    async fn delete_node_cert(&self, name: &str);

    /// Remove remaining site artifacts of a deleted node
    async fn node_cleanup(&self, name: &str);
}

/// [`BootHostManager`] driven by site commands
///
/// Failures of any command are logged; none of these hooks abort a workflow.
pub struct ScriptBootHostManager {
    executor: Arc<dyn CommandExecutor>,
    boot_config_command: Option<String>,
    cert_cleanup_command: Option<String>,
    node_cleanup_command: Option<String>,
}

impl ScriptBootHostManager {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: &CoreConfig) -> Self {
        Self {
            executor,
            boot_config_command: config.boot_config_command.clone(),
            cert_cleanup_command: config.cert_cleanup_command.clone(),
            node_cleanup_command: config.node_cleanup_command.clone(),
        }
    }

    async fn run(&self, command: Option<&str>, args: &str) {
        let Some(command) = command else {
            return;
        };

        let cmd = format!("{command} {args}");
        match self
            .executor
            .run(&cmd)
            .await
            .and_then(CommandResult::into_result)
        {
            Ok(_) => debug!(command = %cmd, "hook completed"),
            Err(e) => warn!(command = %cmd, error = %e, "hook failed"),
        }
    }
}

#[async_trait]
impl BootHostManager for ScriptBootHostManager {
    #[instrument(skip_all, fields(node = %node.name))]
    async fn set_node_for_network_boot(&self, node: &mut Node) {
        node.boot_from = BootFrom::Network;
        self.write_boot_config(node, false).await;
    }

    #[instrument(skip_all, fields(node = %node.name, local_boot))]
    async fn write_boot_config(&self, node: &Node, local_boot: bool) {
        let mode = if local_boot { "local" } else { "network" };
        self.run(self.boot_config_command.as_deref(), &format!("{mode} {}", node.name))
            .await;
    }

    async fn delete_node_cert(&self, name: &str) {
        self.run(self.cert_cleanup_command.as_deref(), name).await;
    }

    async fn node_cleanup(&self, name: &str) {
        self.run(self.node_cleanup_command.as_deref(), name).await;
    }
}

impl std::fmt::Debug for ScriptBootHostManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptBootHostManager")
            .field("executor", &self.executor.executor_type())
            .field("boot_config_command", &self.boot_config_command)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use herdsman_exec::{CommandResult, ExecError};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct RecordingExecutor {
        commands: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl CommandExecutor for RecordingExecutor {
        async fn run(&self, cmd: &str) -> Result<CommandResult, ExecError> {
            self.commands.lock().push(cmd.to_string());
            Err(ExecError::SpawnError("no such file".to_string()))
        }

        async fn run_with_timeout(
            &self,
            cmd: &str,
            _timeout: Duration,
        ) -> Result<CommandResult, ExecError> {
            self.run(cmd).await
        }

        fn executor_type(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_network_boot_rewrites_config() {
        let executor = Arc::new(RecordingExecutor::default());
        let config = CoreConfig {
            boot_config_command: Some("/opt/herdsman/bin/pxe".to_string()),
            ..CoreConfig::default()
        };
        let boot = ScriptBootHostManager::new(executor.clone(), &config);

        let mut node = Node::new("compute-01", "hw1");
        node.boot_from = BootFrom::Disk;
        boot.set_node_for_network_boot(&mut node).await;
        boot.delete_node_cert("compute-01").await;

        assert_eq!(node.boot_from, BootFrom::Network);
        assert_eq!(
            *executor.commands.lock(),
            vec!["/opt/herdsman/bin/pxe network compute-01".to_string()]
        );
    }
}
