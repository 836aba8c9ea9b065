//! Entry point bundling the store and every manager

use herdsman_api::ClusterEvent;
use herdsman_db::Database;
use herdsman_kit::KitManager;
use tokio::sync::broadcast;

use crate::addhost::AddHostManager;
use crate::context::CoreContext;
use crate::network::NetworkManager;
use crate::node::NodeManager;
use crate::profile::SoftwareProfileManager;

/// A provisioned cluster: the store plus the managers operating on it
///
/// Workflows take a [`herdsman_db::Session`] opened from [`Cluster::database`],
/// so callers decide how operations are batched.
#[derive(Debug, Clone)]
pub struct Cluster {
    db: Database,
    ctx: CoreContext,
    add_host: AddHostManager,
    nodes: NodeManager,
    profiles: SoftwareProfileManager,
    networks: NetworkManager,
    kits: KitManager,
}

impl Cluster {
    /// Must be called from within a tokio runtime
    pub fn new(db: Database, ctx: CoreContext) -> Self {
        let add_host = AddHostManager::new(ctx.clone());
        let nodes = NodeManager::new(ctx.clone(), add_host.clone());
        let profiles = SoftwareProfileManager::new(ctx.clone());
        let kits = KitManager::new(ctx.kit_actions.registry().clone());

        Self {
            db,
            ctx,
            add_host,
            nodes,
            profiles,
            networks: NetworkManager::new(),
            kits,
        }
    }

    #[must_use]
    pub fn database(&self) -> &Database {
        &self.db
    }

    #[must_use]
    pub fn context(&self) -> &CoreContext {
        &self.ctx
    }

    /// Subscribe to node state changes
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ClusterEvent> {
        self.ctx.events.subscribe()
    }

    #[must_use]
    pub fn add_host(&self) -> &AddHostManager {
        &self.add_host
    }

    #[must_use]
    pub fn nodes(&self) -> &NodeManager {
        &self.nodes
    }

    #[must_use]
    pub fn software_profiles(&self) -> &SoftwareProfileManager {
        &self.profiles
    }

    #[must_use]
    pub fn networks(&self) -> &NetworkManager {
        &self.networks
    }

    #[must_use]
    pub fn kits(&self) -> &KitManager {
        &self.kits
    }
}
