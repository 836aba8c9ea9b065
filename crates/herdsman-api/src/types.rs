//! Node state and boot types shared by every layer

use std::fmt;

use serde::{Deserialize, Serialize};

/// Provisioning state of a node
///
/// Resource adapters may report intermediate states of their own; those
/// are carried verbatim in [`NodeState::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum NodeState {
    Discovered,
    Allocated,
    Provisioned,
    Installed,
    Deleted,
    Other(String),
}

impl NodeState {
    /// Canonical string form, as persisted and published in events
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            NodeState::Discovered => "Discovered",
            NodeState::Allocated => "Allocated",
            NodeState::Provisioned => "Provisioned",
            NodeState::Installed => "Installed",
            NodeState::Deleted => "Deleted",
            NodeState::Other(s) => s,
        }
    }

    /// Whether the node has entered the terminal `Deleted` state
    #[must_use]
    pub fn is_deleted(&self) -> bool {
        matches!(self, NodeState::Deleted)
    }
}

impl From<&str> for NodeState {
    fn from(value: &str) -> Self {
        match value {
            "Discovered" => NodeState::Discovered,
            "Allocated" => NodeState::Allocated,
            "Provisioned" => NodeState::Provisioned,
            "Installed" => NodeState::Installed,
            "Deleted" => NodeState::Deleted,
            other => NodeState::Other(other.to_string()),
        }
    }
}

impl From<String> for NodeState {
    fn from(value: String) -> Self {
        NodeState::from(value.as_str())
    }
}

impl From<NodeState> for String {
    fn from(value: NodeState) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a node boots from on its next restart
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BootFrom {
    /// PXE / network boot (reinstall)
    #[default]
    Network,
    /// Local disk
    Disk,
}

impl fmt::Display for BootFrom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootFrom::Network => write!(f, "0 (network)"),
            BootFrom::Disk => write!(f, "1 (disk)"),
        }
    }
}
