//! The built-in `base` kit
//!
//! Provides the `installer`, `dns` and `dhcpd` components. `dns` and
//! `dhcpd` regenerate their service configuration through optional site
//! commands, invoked as `<command> <action> <name,name,...>`.

use std::sync::Arc;

use async_trait::async_trait;
use herdsman_db::KitSpec;
use herdsman_exec::CommandExecutor;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::action::KitAction;
use crate::error::KitError;
use crate::traits::{ComponentInstaller, KitInstaller};

/// Name of the built-in kit
pub const BASE_KIT: &str = "base";

/// Site commands used by the base kit components
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BaseKitConfig {
    /// Regenerates DNS records
    #[serde(default)]
    pub dns_command: Option<String>,
    /// Regenerates DHCP host entries
    #[serde(default)]
    pub dhcpd_command: Option<String>,
}

/// The base kit installer
pub struct BaseKit {
    spec: KitSpec,
    components: Vec<Arc<dyn ComponentInstaller>>,
}

impl BaseKit {
    pub fn new(executor: Arc<dyn CommandExecutor>, config: &BaseKitConfig) -> Self {
        let version = env!("CARGO_PKG_VERSION");

        let components: Vec<Arc<dyn ComponentInstaller>> = vec![
            Arc::new(CommandComponent {
                name: "installer",
                version,
                installer_only: true,
                command: None,
                executor: executor.clone(),
            }),
            Arc::new(CommandComponent {
                name: "dns",
                version,
                installer_only: true,
                command: config.dns_command.clone(),
                executor: executor.clone(),
            }),
            Arc::new(CommandComponent {
                name: "dhcpd",
                version,
                installer_only: true,
                command: config.dhcpd_command.clone(),
                executor,
            }),
        ];

        Self {
            spec: KitSpec::new(BASE_KIT, version, "0"),
            components,
        }
    }
}

impl KitInstaller for BaseKit {
    fn spec(&self) -> &KitSpec {
        &self.spec
    }

    fn description(&self) -> Option<&str> {
        Some("Core installer services")
    }

    fn components(&self) -> Vec<Arc<dyn ComponentInstaller>> {
        self.components.clone()
    }
}

/// Component that forwards host actions to a site command
struct CommandComponent {
    name: &'static str,
    version: &'static str,
    installer_only: bool,
    command: Option<String>,
    executor: Arc<dyn CommandExecutor>,
}

impl CommandComponent {
    fn command_line(command: &str, action: &KitAction) -> Option<String> {
        let targets = match action {
            KitAction::AddHost { nodes, .. } | KitAction::DeleteHost { nodes, .. } => nodes.join(","),
            KitAction::Refresh { software_profiles } => software_profiles.join(","),
            _ => return None,
        };

        Some(format!("{command} {} {targets}", action.name()))
    }
}

#[async_trait]
impl ComponentInstaller for CommandComponent {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> &str {
        self.version
    }

    fn installer_only(&self) -> bool {
        self.installer_only
    }

    #[instrument(skip(self), fields(component = self.name))]
    async fn run_action(&self, action: &KitAction) -> Result<(), KitError> {
        let Some(command) = &self.command else {
            return Ok(());
        };
        let Some(cmd) = Self::command_line(command, action) else {
            return Ok(());
        };

        debug!(command = %cmd, "running component command");
        let result = self.executor.run(&cmd).await?;
        if !result.success() {
            return Err(KitError::ActionFailed {
                component: self.name.to_string(),
                action: action.name(),
                reason: result.stderr.trim().to_string(),
            });
        }

        Ok(())
    }
}
