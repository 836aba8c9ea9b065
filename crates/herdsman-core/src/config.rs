//! Core configuration

use serde::{Deserialize, Serialize};

/// Settings shared by all core managers
///
/// Built once at startup and passed around as `Arc<CoreConfig>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Host name of the installer node; never selected for deletion
    #[serde(default = "default_installer_hostname")]
    pub installer_hostname: String,
    /// Kit ordered first for add actions and last for delete actions
    #[serde(default = "default_base_kit")]
    pub base_kit: String,
    /// Capacity of the cluster event broadcast channel
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
    /// Hook script used by the `default` resource adapter
    #[serde(default)]
    pub hook_script: Option<String>,
    /// DNS zone appended to generated host names
    #[serde(default)]
    pub dns_zone: Option<String>,
    /// Command run by the cluster update worker
    #[serde(default)]
    pub cluster_update_command: Option<String>,
    /// Seconds to wait before running a scheduled cluster update
    #[serde(default = "default_cluster_update_delay_secs")]
    pub cluster_update_delay_secs: u64,
    /// Writes boot (PXE) configuration: `<cmd> <local|network> <node>`
    #[serde(default)]
    pub boot_config_command: Option<String>,
    /// Revokes the configuration-management certificate of a deleted node
    #[serde(default)]
    pub cert_cleanup_command: Option<String>,
    /// Removes remaining artifacts of a deleted node
    #[serde(default)]
    pub node_cleanup_command: Option<String>,
}

fn default_installer_hostname() -> String {
    "installer".to_string()
}

fn default_base_kit() -> String {
    "base".to_string()
}

fn default_event_channel_capacity() -> usize {
    1024
}

fn default_cluster_update_delay_secs() -> u64 {
    5
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            installer_hostname: default_installer_hostname(),
            base_kit: default_base_kit(),
            event_channel_capacity: default_event_channel_capacity(),
            hook_script: None,
            dns_zone: None,
            cluster_update_command: None,
            cluster_update_delay_secs: default_cluster_update_delay_secs(),
            boot_config_command: None,
            cert_cleanup_command: None,
            node_cleanup_command: None,
        }
    }
}

impl CoreConfig {
    #[must_use]
    pub fn with_installer_hostname(mut self, name: impl Into<String>) -> Self {
        self.installer_hostname = name.into();
        self
    }

    #[must_use]
    pub fn with_base_kit(mut self, name: impl Into<String>) -> Self {
        self.base_kit = name.into();
        self
    }
}
