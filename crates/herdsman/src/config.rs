//! Configuration loading and types

use std::path::{Path, PathBuf};

use herdsman_core::CoreConfig;
use herdsman_db::{Location, LockedState, Network, ProfileKind};
use herdsman_kit::BaseKitConfig;
use serde::{Deserialize, Serialize};

/// Top-level configuration for the herdsman daemon
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Daemon settings
    #[serde(default)]
    pub daemon: DaemonConfig,
    /// Provisioning core settings
    #[serde(default)]
    pub core: CoreConfig,
    /// Site commands of the base kit
    #[serde(default)]
    pub base_kit: BaseKitConfig,
    /// Networks created at startup
    #[serde(default)]
    pub network: Vec<Network>,
    /// Hardware profiles created at startup
    #[serde(default)]
    pub hardware_profile: Vec<HardwareProfileSeed>,
    /// Software profiles created at startup
    #[serde(default)]
    pub software_profile: Vec<SoftwareProfileSeed>,
}

/// Daemon settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` takes precedence
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Emit logs as JSON
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Hardware profile declared in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HardwareProfileSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_name_format")]
    pub name_format: String,
    #[serde(default = "default_resource_adapter")]
    pub resource_adapter: Option<String>,
    #[serde(default)]
    pub location: Location,
    /// Provisioning networks as `address/netmask`
    #[serde(default)]
    pub networks: Vec<String>,
}

fn default_name_format() -> String {
    "*".to_string()
}

fn default_resource_adapter() -> Option<String> {
    Some(herdsman_adapter::DEFAULT_ADAPTER.to_string())
}

/// Software profile declared in the configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SoftwareProfileSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: ProfileKind,
    #[serde(default)]
    pub idle: bool,
    #[serde(default)]
    pub locked_state: LockedState,
    #[serde(default)]
    pub min_nodes: u32,
    /// Base kit components to enable
    #[serde(default)]
    pub components: Vec<String>,
}

impl Config {
    /// Load configuration from file
    ///
    /// # Errors
    /// Returns error if file cannot be read or parsed
    pub fn load(path: &Path) -> eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load from the environment or default paths, or use defaults
    ///
    /// # Errors
    /// Returns error if a file is found but cannot be read or parsed
    pub fn load_default() -> eyre::Result<Self> {
        if let Ok(path) = std::env::var("HERDSMAN_CONFIG") {
            return Self::load(&PathBuf::from(path));
        }

        let mut paths = vec![
            PathBuf::from("herdsman.toml"),
            PathBuf::from("/etc/herdsman/herdsman.toml"),
        ];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("herdsman/herdsman.toml"));
        }

        for path in paths {
            if path.exists() {
                return Self::load(&path);
            }
        }

        tracing::warn!("no config file found, using defaults");
        Ok(Config::default())
    }
}
