//! Dependencies shared by the core managers

use std::sync::Arc;

use herdsman_adapter::{AdapterRegistry, ResourceAdapter};
use herdsman_db::HardwareProfile;
use herdsman_kit::{KitActionsManager, KitRegistry};
use uuid::Uuid;

use crate::boot::BootHostManager;
use crate::config::CoreConfig;
use crate::error::CoreError;
use crate::events::EventBus;
use crate::sync::ClusterUpdateScheduler;

/// Handles to everything a workflow may call out to
#[derive(Clone)]
pub struct CoreContext {
    pub config: Arc<CoreConfig>,
    pub adapters: Arc<AdapterRegistry>,
    pub kit_actions: KitActionsManager,
    pub boot: Arc<dyn BootHostManager>,
    pub scheduler: Arc<dyn ClusterUpdateScheduler>,
    pub events: EventBus,
}

impl CoreContext {
    pub fn new(
        config: Arc<CoreConfig>,
        adapters: Arc<AdapterRegistry>,
        kits: Arc<KitRegistry>,
        boot: Arc<dyn BootHostManager>,
        scheduler: Arc<dyn ClusterUpdateScheduler>,
    ) -> Self {
        let events = EventBus::new(config.event_channel_capacity);
        let kit_actions = KitActionsManager::new(kits, config.base_kit.clone());

        Self {
            config,
            adapters,
            kit_actions,
            boot,
            scheduler,
            events,
        }
    }

    /// Instantiate the resource adapter of a hardware profile
    ///
    /// # Errors
    /// `ResourceAdapterNotFound` if the profile names no adapter or the
    /// named adapter is not registered
    pub fn resource_adapter(
        &self,
        hardware_profile: &HardwareProfile,
        add_host_session: Option<Uuid>,
    ) -> Result<Arc<dyn ResourceAdapter>, CoreError> {
        let Some(name) = &hardware_profile.resource_adapter else {
            return Err(CoreError::ResourceAdapterNotFound(format!(
                "resource adapter not defined for hardware profile [{}]",
                hardware_profile.name
            )));
        };

        Ok(self.adapters.create(name, add_host_session)?)
    }
}

impl std::fmt::Debug for CoreContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CoreContext")
            .field("config", &self.config)
            .field("adapters", &self.adapters)
            .field("kit_actions", &self.kit_actions)
            .finish_non_exhaustive()
    }
}
