//! herdsman-api: Shared request, response and event types
//!
//! Contains the types exchanged between the orchestration core and the
//! layers that sit on top of it (CLI, web service, event subscribers).

pub mod events;
pub mod requests;
pub mod responses;
pub mod types;

pub use events::ClusterEvent;
pub use requests::{AddHostRequest, NicDefinition, NodeDetails, UpdateNodeRequest};
pub use responses::{AddHostStatus, DeleteNodeResult, NicSnapshot, NodeSnapshot};
pub use types::{BootFrom, NodeState};
