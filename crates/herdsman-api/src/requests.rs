//! Request types consumed by the orchestration core

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::NodeState;

/// Network interface definition for a node being added or updated
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NicDefinition {
    /// MAC address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    /// IP address
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    /// Network this interface is attached to (`address/netmask`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<String>,
    /// Device name (eth0, ens3, ...)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<String>,
    /// Whether this is the provisioning (boot) interface
    #[serde(default)]
    pub boot: bool,
}

/// Per-node details of an add-host request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeDetails {
    /// Explicit host name; only allowed for wildcard hardware profiles
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Rack identifier
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rack: Option<i32>,
    /// Network interfaces
    #[serde(default)]
    pub nics: Vec<NicDefinition>,
}

/// Request to provision one or more nodes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddHostRequest {
    /// Target hardware profile name
    pub hardware_profile: String,
    /// Target software profile name; `None` adds idle nodes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub software_profile: Option<String>,
    /// Add-host session correlating this request with its nodes
    pub add_host_session: Uuid,
    /// Number of nodes to create when no per-node details are given
    #[serde(default)]
    pub count: usize,
    /// Per-node details
    #[serde(default)]
    pub node_details: Vec<NodeDetails>,
    /// Tags applied to every created node
    #[serde(default)]
    pub tags: BTreeMap<String, String>,
}

impl AddHostRequest {
    /// Create a request for the given hardware profile and session
    pub fn new(hardware_profile: impl Into<String>, add_host_session: Uuid) -> Self {
        Self {
            hardware_profile: hardware_profile.into(),
            software_profile: None,
            add_host_session,
            count: 0,
            node_details: Vec::new(),
            tags: BTreeMap::new(),
        }
    }

    /// Set the software profile
    #[must_use]
    pub fn with_software_profile(mut self, name: impl Into<String>) -> Self {
        self.software_profile = Some(name.into());
        self
    }

    /// Add a node definition
    #[must_use]
    pub fn with_node(mut self, details: NodeDetails) -> Self {
        self.node_details.push(details);
        self
    }

    /// Request `count` nodes with generated names
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = count;
        self
    }

    /// Add a tag
    #[must_use]
    pub fn with_tag(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(name.into(), value.into());
        self
    }

    /// Number of nodes this request asks for
    #[must_use]
    pub fn requested_nodes(&self) -> usize {
        if self.node_details.is_empty() {
            self.count
        } else {
            self.node_details.len()
        }
    }
}

/// Resource-adapter-specific node update
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateNodeRequest {
    /// New node state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<NodeState>,
    /// Interface changes; only the first entry is applied to the boot NIC
    #[serde(default)]
    pub nics: Vec<NicDefinition>,
    /// Adapter-specific key/value data
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}
