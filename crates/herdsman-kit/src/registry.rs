//! Process-wide kit installer registry

use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use herdsman_db::KitSpec;

use crate::error::KitError;
use crate::traits::KitInstaller;

/// Registered kit installers in registration order
///
/// Written once per kit at startup, read by every dispatch afterwards.
#[derive(Default)]
pub struct KitRegistry {
    kits: RwLock<Vec<Arc<dyn KitInstaller>>>,
}

impl KitRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a kit installer
    ///
    /// Registering a spec that is already known is a no-op; returns whether
    /// the kit was added.
    pub fn register(&self, kit: Arc<dyn KitInstaller>) -> bool {
        let mut kits = self.kits.write();
        if kits.iter().any(|k| k.spec() == kit.spec()) {
            debug!(kit = %kit.spec(), "kit installer already registered");
            return false;
        }

        debug!(kit = %kit.spec(), "registered kit installer");
        kits.push(kit);
        true
    }

    /// Kit installer for `spec`
    ///
    /// # Errors
    /// Returns `KitNotFound` if no installer is registered for `spec`
    pub fn get(&self, spec: &KitSpec) -> Result<Arc<dyn KitInstaller>, KitError> {
        self.kits
            .read()
            .iter()
            .find(|k| k.spec() == spec)
            .cloned()
            .ok_or_else(|| KitError::KitNotFound(spec.to_string()))
    }

    /// Snapshot of all kit installers in registration order
    #[must_use]
    pub fn all(&self) -> Vec<Arc<dyn KitInstaller>> {
        self.kits.read().clone()
    }
}

impl std::fmt::Debug for KitRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let specs: Vec<String> = self.kits.read().iter().map(|k| k.spec().to_string()).collect();
        f.debug_struct("KitRegistry").field("kits", &specs).finish()
    }
}
