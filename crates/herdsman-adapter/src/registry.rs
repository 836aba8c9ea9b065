//! Name to factory registry of resource adapters

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AdapterError;
use crate::traits::ResourceAdapter;

/// Creates adapter instances bound to an add-host session
pub trait AdapterFactory: Send + Sync {
    /// Build an adapter; `add_host_session` is set for add-host workflows
    fn create(&self, add_host_session: Option<Uuid>) -> Arc<dyn ResourceAdapter>;
}

impl<F> AdapterFactory for F
where
    F: Fn(Option<Uuid>) -> Arc<dyn ResourceAdapter> + Send + Sync,
{
    fn create(&self, add_host_session: Option<Uuid>) -> Arc<dyn ResourceAdapter> {
        self(add_host_session)
    }
}

/// Process-wide set of known resource adapters
///
/// Populated at startup, read by every workflow afterwards.
#[derive(Default)]
pub struct AdapterRegistry {
    factories: RwLock<BTreeMap<String, Arc<dyn AdapterFactory>>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`, replacing any previous one
    pub fn register(&self, name: impl Into<String>, factory: Arc<dyn AdapterFactory>) {
        let name = name.into();
        if self.factories.write().insert(name.clone(), factory).is_some() {
            warn!(adapter = %name, "replaced resource adapter registration");
        } else {
            debug!(adapter = %name, "registered resource adapter");
        }
    }

    /// Instantiate the adapter registered as `name`
    ///
    /// # Errors
    /// Returns `NotRegistered` if nothing is registered under `name`
    pub fn create(
        &self,
        name: &str,
        add_host_session: Option<Uuid>,
    ) -> Result<Arc<dyn ResourceAdapter>, AdapterError> {
        let factory = self
            .factories
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| AdapterError::NotRegistered(name.to_string()))?;

        Ok(factory.create(add_host_session))
    }

    /// Registered adapter names, sorted
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.factories.read().keys().cloned().collect()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("adapters", &self.names())
            .finish()
    }
}
