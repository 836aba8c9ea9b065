//! Cluster event types

use serde::{Deserialize, Serialize};

use crate::responses::NodeSnapshot;
use crate::types::NodeState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClusterEvent {
    NodeStateChanged {
        node: NodeSnapshot,
        previous_state: NodeState,
    },
}
