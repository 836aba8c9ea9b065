//! Kit and component installer contracts

use std::sync::Arc;

use async_trait::async_trait;
use herdsman_db::{ComponentRecord, KitRecord, KitSpec, ProfileKind, SoftwareProfile};

use crate::action::KitAction;
use crate::error::KitError;

/// A component of a kit, enabled per software profile
#[async_trait]
pub trait ComponentInstaller: Send + Sync {
    /// Component name, unique within its kit
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    fn description(&self) -> Option<&str> {
        None
    }

    /// Component may only be enabled on installer profiles
    fn installer_only(&self) -> bool {
        false
    }

    /// Check whether the component may be enabled on `profile`
    ///
    /// # Errors
    /// Returns `ConfigurationError` when the profile kind is not allowed
    fn check_enableable(&self, profile: &SoftwareProfile) -> Result<(), KitError> {
        if profile.kind == ProfileKind::Compute && self.installer_only() {
            return Err(KitError::ConfigurationError(format!(
                "component can only be enabled on installer software profiles: {}",
                self.name()
            )));
        }
        Ok(())
    }

    /// Handle a lifecycle action; unhandled actions are no-ops
    async fn run_action(&self, _action: &KitAction) -> Result<(), KitError> {
        Ok(())
    }
}

/// A versioned plugin package
#[async_trait]
pub trait KitInstaller: Send + Sync {
    /// `(name, version, iteration)` identity
    fn spec(&self) -> &KitSpec;

    fn description(&self) -> Option<&str> {
        None
    }

    /// All component installers in declaration order
    fn components(&self) -> Vec<Arc<dyn ComponentInstaller>>;

    /// Component installer by name
    fn component(&self, name: &str) -> Option<Arc<dyn ComponentInstaller>> {
        self.components().into_iter().find(|c| c.name() == name)
    }

    /// Handle a kit-level action (install/uninstall family)
    async fn run_action(&self, _action: &KitAction) -> Result<(), KitError> {
        Ok(())
    }

    /// Metadata persisted when the kit is installed
    fn record(&self) -> KitRecord {
        KitRecord {
            id: 0,
            spec: self.spec().clone(),
            description: self.description().map(str::to_string),
            components: self
                .components()
                .iter()
                .map(|c| ComponentRecord {
                    name: c.name().to_string(),
                    version: c.version().to_string(),
                    description: c.description().map(str::to_string),
                })
                .collect(),
        }
    }
}
