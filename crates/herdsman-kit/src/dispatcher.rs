//! Kit action dispatch
//!
//! Actions are delivered to every *enabled* component of every registered
//! kit. A component is enabled when a component of the same name is active
//! on at least one software profile; this is looked up in the session on
//! every dispatch and never cached.

use std::collections::BTreeSet;
use std::sync::Arc;

use herdsman_api::NodeState;
use herdsman_db::Session;
use tracing::{debug, instrument, warn};

use crate::action::KitAction;
use crate::error::KitError;
use crate::registry::KitRegistry;
use crate::traits::{ComponentInstaller, KitInstaller};

/// Where the base kit is placed when ordering kits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseKitOrder {
    /// Registration order
    Any,
    /// Base kit runs before all others (host-add family)
    First,
    /// Base kit runs after all others (host-delete family)
    Last,
}

/// Fans lifecycle actions out to enabled components
#[derive(Debug, Clone)]
pub struct KitActionsManager {
    registry: Arc<KitRegistry>,
    base_kit: String,
}

impl KitActionsManager {
    pub fn new(registry: Arc<KitRegistry>, base_kit: impl Into<String>) -> Self {
        Self {
            registry,
            base_kit: base_kit.into(),
        }
    }

    /// The underlying kit registry
    #[must_use]
    pub fn registry(&self) -> &Arc<KitRegistry> {
        &self.registry
    }

    /// Registered kits with the base kit moved according to `order`
    #[must_use]
    pub fn load_kits(&self, order: BaseKitOrder) -> Vec<Arc<dyn KitInstaller>> {
        let mut kits = self.registry.all();
        if order == BaseKitOrder::Any {
            return kits;
        }

        if let Some(idx) = kits.iter().position(|k| k.spec().name == self.base_kit) {
            let base = kits.remove(idx);
            match order {
                BaseKitOrder::First => kits.insert(0, base),
                _ => kits.push(base),
            }
        }

        kits
    }

    /// Component installers of all kits, in kit order
    #[must_use]
    pub fn all_component_installers(&self, order: BaseKitOrder) -> Vec<Arc<dyn ComponentInstaller>> {
        self.load_kits(order)
            .iter()
            .flat_map(|kit| kit.components())
            .collect()
    }

    /// Component installers whose component is enabled on some software profile
    #[must_use]
    pub fn enabled_component_installers(
        &self,
        session: &Session,
        order: BaseKitOrder,
    ) -> Vec<Arc<dyn ComponentInstaller>> {
        let enabled: BTreeSet<String> = session.enabled_component_names();

        self.all_component_installers(order)
            .into_iter()
            .filter(|c| enabled.contains(c.name()))
            .collect()
    }

    /// First registered component installer named `name`
    #[must_use]
    pub fn load_component(&self, name: &str) -> Option<Arc<dyn ComponentInstaller>> {
        self.all_component_installers(BaseKitOrder::Any)
            .into_iter()
            .find(|c| c.name() == name)
    }

    /// Called for each node created by a resource adapter, before it is persisted
    ///
    /// # Errors
    /// Propagates the first component failure
    #[instrument(skip(self, session))]
    pub async fn pre_add_host(
        &self,
        session: &Session,
        hardware_profile: &str,
        software_profile: Option<&str>,
        hostname: &str,
        ip: Option<&str>,
    ) -> Result<(), KitError> {
        let action = KitAction::PreAddHost {
            hardware_profile: hardware_profile.to_string(),
            software_profile: software_profile.map(str::to_string),
            hostname: hostname.to_string(),
            ip: ip.map(str::to_string),
        };

        let components = self.enabled_component_installers(session, BaseKitOrder::First);
        run_on_components(&components, &action).await
    }

    /// Post add-host processing for nodes of one (hardware, software) profile pair
    ///
    /// # Errors
    /// Propagates the first component failure
    #[instrument(skip(self, session, nodes), fields(nodes = nodes.len()))]
    pub async fn post_add_host(
        &self,
        session: &Session,
        hardware_profile: &str,
        software_profile: Option<&str>,
        nodes: &[String],
    ) -> Result<(), KitError> {
        let action = KitAction::AddHost {
            hardware_profile: hardware_profile.to_string(),
            software_profile: software_profile.map(str::to_string),
            nodes: nodes.to_vec(),
        };

        let components = self.enabled_component_installers(session, BaseKitOrder::First);
        run_on_components(&components, &action).await
    }

    /// Ask components to regenerate configuration for `software_profiles`
    ///
    /// # Errors
    /// Propagates the first component failure
    #[instrument(skip(self, session))]
    pub async fn refresh(
        &self,
        session: &Session,
        software_profiles: &[String],
    ) -> Result<(), KitError> {
        let action = KitAction::Refresh {
            software_profiles: software_profiles.to_vec(),
        };

        let components = self.enabled_component_installers(session, BaseKitOrder::First);
        run_on_components(&components, &action).await
    }

    /// Pre-delete processing; runs before any node is marked deleted
    ///
    /// # Errors
    /// Propagates the first component failure
    pub async fn pre_delete_host(
        &self,
        session: &Session,
        hardware_profile: &str,
        software_profile: Option<&str>,
        nodes: &[String],
    ) -> Result<(), KitError> {
        let nodes = aggregate_deleted(session, software_profile, nodes);
        let action = KitAction::PreDeleteHost {
            hardware_profile: hardware_profile.to_string(),
            software_profile: software_profile.map(str::to_string),
            nodes,
        };

        self.delete_host_action(session, &action).await
    }

    /// Post-delete processing; component failures are logged and skipped
    ///
    /// # Errors
    /// Only fails if the dispatch itself cannot run
    pub async fn post_delete_host(
        &self,
        session: &Session,
        hardware_profile: &str,
        software_profile: Option<&str>,
        nodes: &[String],
    ) -> Result<(), KitError> {
        let nodes = aggregate_deleted(session, software_profile, nodes);
        let action = KitAction::DeleteHost {
            hardware_profile: hardware_profile.to_string(),
            software_profile: software_profile.map(str::to_string),
            nodes,
        };

        self.delete_host_action(session, &action).await
    }

    #[instrument(skip_all, fields(action = %action))]
    async fn delete_host_action(&self, session: &Session, action: &KitAction) -> Result<(), KitError> {
        let components = self.enabled_component_installers(session, BaseKitOrder::Last);
        run_on_components(&components, action).await
    }
}

/// Requested node names plus nodes of the software profile (or of any
/// profile when `None`) still recorded as `Deleted` from an earlier,
/// interrupted deletion
fn aggregate_deleted(
    session: &Session,
    software_profile: Option<&str>,
    requested: &[String],
) -> Vec<String> {
    let mut names: BTreeSet<String> = requested.iter().cloned().collect();
    names.extend(
        session
            .nodes_by_state(&NodeState::Deleted, software_profile)
            .into_iter()
            .map(|n| n.name),
    );
    names.into_iter().collect()
}

/// Run `action` on each component in order
///
/// Teardown actions log failures and continue; all others stop at the
/// first failure.
async fn run_on_components(
    components: &[Arc<dyn ComponentInstaller>],
    action: &KitAction,
) -> Result<(), KitError> {
    for component in components {
        debug!(component = component.name(), action = %action, "running component action");

        if let Err(e) = component.run_action(action).await {
            if action.is_teardown() {
                warn!(component = component.name(), action = %action, error = %e, "component action failed");
                continue;
            }
            return Err(e);
        }
    }

    Ok(())
}
