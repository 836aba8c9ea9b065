//! herdsman-core: Provisioning workflows
//!
//! Add-host orchestration, the node lifecycle, software profile components
//! and networks. Add-host sessions are owned by a kameo actor; cluster
//! configuration updates are coalesced by a background worker.

pub mod actor;
pub mod addhost;
pub mod boot;
pub mod cluster;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod message;
pub mod network;
pub mod node;
pub mod profile;
pub mod sync;

pub use actor::AddHostSessionActor;
pub use addhost::AddHostManager;
pub use boot::{BootHostManager, ScriptBootHostManager};
pub use cluster::Cluster;
pub use config::CoreConfig;
pub use context::CoreContext;
pub use error::CoreError;
pub use events::EventBus;
pub use message::{
    CreateSession, DeleteSessions, GetStatus, NewSession, UpdateSession, UpdateStatus,
};
pub use network::NetworkManager;
pub use node::NodeManager;
pub use profile::SoftwareProfileManager;
pub use sync::{ClusterUpdateScheduler, SyncManager};
