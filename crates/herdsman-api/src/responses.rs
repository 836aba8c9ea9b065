//! Response types returned by the orchestration core

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::{BootFrom, NodeState};

/// Network interface as seen by API consumers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicSnapshot {
    pub mac: Option<String>,
    pub ip: Option<String>,
    pub network: Option<String>,
    pub device: Option<String>,
    pub boot: bool,
}

/// Point-in-time copy of a node record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub name: String,
    pub state: NodeState,
    pub rack: Option<i32>,
    pub add_host_session: Option<Uuid>,
    pub boot_from: BootFrom,
    pub last_update: Option<DateTime<Utc>>,
    pub hardware_profile: String,
    pub software_profile: Option<String>,
    pub nics: Vec<NicSnapshot>,
    pub tags: BTreeMap<String, String>,
}

/// Progress of an add-host session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddHostStatus {
    /// Whether the add-host workflow is still running
    pub running: bool,
    /// Progress messages (possibly a slice starting at a requested offset)
    pub messages: Vec<String>,
    /// Nodes produced by the session so far
    pub nodes: Vec<NodeSnapshot>,
}

/// Outcome of a delete workflow
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteNodeResult {
    /// Names of the nodes removed
    pub nodes_deleted: Vec<String>,
}
