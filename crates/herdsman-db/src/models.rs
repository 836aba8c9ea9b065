//! Row types held by the store

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use herdsman_api::{BootFrom, NodeState};

/// Row identifier, assigned on insert
pub type RowId = u64;

/// A managed machine or instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: RowId,
    /// Unique host name
    pub name: String,
    pub state: NodeState,
    pub rack: Option<i32>,
    /// Add-host session that produced this node
    pub add_host_session: Option<Uuid>,
    pub boot_from: BootFrom,
    pub last_update: Option<DateTime<Utc>>,
    /// Owning hardware profile (by name)
    pub hardware_profile: String,
    /// Owning software profile (by name), `None` for idle nodes
    pub software_profile: Option<String>,
    pub nics: Vec<Nic>,
    pub tags: BTreeSet<RowId>,
}

impl Node {
    /// Create an unsaved node in the `Discovered` state
    pub fn new(name: impl Into<String>, hardware_profile: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            state: NodeState::Discovered,
            rack: None,
            add_host_session: None,
            boot_from: BootFrom::Network,
            last_update: None,
            hardware_profile: hardware_profile.into(),
            software_profile: None,
            nics: Vec::new(),
            tags: BTreeSet::new(),
        }
    }

    /// Set the software profile
    #[must_use]
    pub fn with_software_profile(mut self, name: Option<impl Into<String>>) -> Self {
        self.software_profile = name.map(Into::into);
        self
    }

    /// Set the initial state
    #[must_use]
    pub fn with_state(mut self, state: NodeState) -> Self {
        self.state = state;
        self
    }

    /// Set the add-host session
    #[must_use]
    pub fn with_add_host_session(mut self, session: Uuid) -> Self {
        self.add_host_session = Some(session);
        self
    }

    /// Add a network interface
    #[must_use]
    pub fn with_nic(mut self, nic: Nic) -> Self {
        self.nics.push(nic);
        self
    }

    /// The provisioning interface, if any
    #[must_use]
    pub fn boot_nic(&self) -> Option<&Nic> {
        self.nics.iter().find(|n| n.boot).or_else(|| self.nics.first())
    }
}

/// Network interface of a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Nic {
    pub mac: Option<String>,
    pub ip: Option<String>,
    /// Attached network row
    pub network: Option<RowId>,
    pub device: Option<String>,
    pub boot: bool,
}

/// Where hardware described by a profile lives
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    /// On-premise; boot configuration is managed locally
    #[default]
    Local,
    /// Cloud or otherwise remote; no local boot configuration
    Remote,
}

/// Class of physical/virtual resource, bound to one resource adapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareProfile {
    pub id: RowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `*` requires explicit host names; anything else is a name template
    pub name_format: String,
    /// Resource adapter name
    #[serde(default)]
    pub resource_adapter: Option<String>,
    #[serde(default)]
    pub location: Location,
    /// Provisioning networks
    #[serde(default)]
    pub networks: BTreeSet<RowId>,
    #[serde(default)]
    pub tags: BTreeSet<RowId>,
}

impl HardwareProfile {
    pub fn new(name: impl Into<String>, name_format: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: None,
            name_format: name_format.into(),
            resource_adapter: None,
            location: Location::Local,
            networks: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_resource_adapter(mut self, adapter: impl Into<String>) -> Self {
        self.resource_adapter = Some(adapter.into());
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = location;
        self
    }
}

/// Software profile lock level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum LockedState {
    #[default]
    Unlocked,
    SoftLocked,
    HardLocked,
}

impl fmt::Display for LockedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockedState::Unlocked => write!(f, "Unlocked"),
            LockedState::SoftLocked => write!(f, "SoftLocked"),
            LockedState::HardLocked => write!(f, "HardLocked"),
        }
    }
}

/// Role of a software profile
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileKind {
    #[default]
    Compute,
    Installer,
}

/// Reference to a component of an installed kit
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentRef {
    pub kit: KitSpec,
    pub name: String,
}

/// Installed role/image for a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SoftwareProfile {
    pub id: RowId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: ProfileKind,
    /// Idle profiles skip post-add provisioning hooks
    #[serde(default)]
    pub is_idle: bool,
    #[serde(default)]
    pub locked_state: LockedState,
    /// Minimum number of nodes; `0` disables the check
    #[serde(default)]
    pub min_nodes: u32,
    /// Components enabled on this profile
    #[serde(default)]
    pub components: BTreeSet<ComponentRef>,
    #[serde(default)]
    pub tags: BTreeSet<RowId>,
}

impl SoftwareProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            description: None,
            kind: ProfileKind::Compute,
            is_idle: false,
            locked_state: LockedState::Unlocked,
            min_nodes: 0,
            components: BTreeSet::new(),
            tags: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_min_nodes(mut self, min_nodes: u32) -> Self {
        self.min_nodes = min_nodes;
        self
    }

    #[must_use]
    pub fn with_locked_state(mut self, locked_state: LockedState) -> Self {
        self.locked_state = locked_state;
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ProfileKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub fn idle(mut self) -> Self {
        self.is_idle = true;
        self
    }
}

/// Name/value pair attachable to nodes and profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: RowId,
    pub name: String,
    pub value: String,
}

/// Provisioning or public network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Network {
    #[serde(default)]
    pub id: RowId,
    #[serde(default)]
    pub name: Option<String>,
    pub address: String,
    pub netmask: String,
    #[serde(default)]
    pub gateway: Option<String>,
    #[serde(default = "default_network_type")]
    pub network_type: String,
    /// First address handed out; the first host address when unset
    #[serde(default)]
    pub start_ip: Option<String>,
    /// Step between allocated addresses
    #[serde(default = "default_increment")]
    pub increment: u32,
    /// Addresses are assigned by an external DHCP server
    #[serde(default)]
    pub using_dhcp: bool,
}

fn default_network_type() -> String {
    "provision".to_string()
}

fn default_increment() -> u32 {
    1
}

impl Network {
    pub fn new(address: impl Into<String>, netmask: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: None,
            address: address.into(),
            netmask: netmask.into(),
            gateway: None,
            network_type: default_network_type(),
            start_ip: None,
            increment: default_increment(),
            using_dhcp: false,
        }
    }

    #[must_use]
    pub fn with_start_ip(mut self, start_ip: impl Into<String>) -> Self {
        self.start_ip = Some(start_ip.into());
        self
    }

    #[must_use]
    pub fn with_increment(mut self, increment: u32) -> Self {
        self.increment = increment;
        self
    }

    #[must_use]
    pub fn with_dhcp(mut self) -> Self {
        self.using_dhcp = true;
        self
    }

    /// Whether nodes provision over this network
    #[must_use]
    pub fn is_provisioning(&self) -> bool {
        self.network_type == "provision"
    }

    /// `address/netmask` form used in NIC definitions
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}/{}", self.address, self.netmask)
    }
}

/// Identity of a kit: `(name, version, iteration)`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KitSpec {
    pub name: String,
    pub version: String,
    pub iteration: String,
}

impl KitSpec {
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        iteration: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            iteration: iteration.into(),
        }
    }
}

impl fmt::Display for KitSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.name, self.version, self.iteration)
    }
}

/// Component metadata persisted with an installed kit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub version: String,
    pub description: Option<String>,
}

/// Installed kit metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KitRecord {
    pub id: RowId,
    pub spec: KitSpec,
    pub description: Option<String>,
    pub components: Vec<ComponentRecord>,
}
