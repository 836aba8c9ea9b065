//! Lifecycle actions delivered to kits and components

use std::fmt;

/// A named lifecycle action with its arguments
///
/// Install and uninstall actions are delivered to kit installers; every
/// other action goes to component installers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KitAction {
    PreInstall,
    PostInstall,
    PreUninstall,
    PostUninstall,
    /// A node was created but not yet persisted
    PreAddHost {
        hardware_profile: String,
        software_profile: Option<String>,
        hostname: String,
        ip: Option<String>,
    },
    /// Nodes were added to a (hardware, software) profile pair
    AddHost {
        hardware_profile: String,
        software_profile: Option<String>,
        nodes: Vec<String>,
    },
    /// Nodes are about to be deleted
    PreDeleteHost {
        hardware_profile: String,
        software_profile: Option<String>,
        nodes: Vec<String>,
    },
    /// Nodes were deleted
    DeleteHost {
        hardware_profile: String,
        software_profile: Option<String>,
        nodes: Vec<String>,
    },
    /// Regenerate configuration for software profiles
    Refresh { software_profiles: Vec<String> },
    PreEnable { software_profile: String },
    Enable { software_profile: String },
    PostEnable { software_profile: String },
    PreDisable { software_profile: String },
    Disable { software_profile: String },
    PostDisable { software_profile: String },
}

impl KitAction {
    /// Action name as seen by hook scripts
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            KitAction::PreInstall => "pre_install",
            KitAction::PostInstall => "post_install",
            KitAction::PreUninstall => "pre_uninstall",
            KitAction::PostUninstall => "post_uninstall",
            KitAction::PreAddHost { .. } => "pre_add_host",
            KitAction::AddHost { .. } => "add_host",
            KitAction::PreDeleteHost { .. } => "pre_delete_host",
            KitAction::DeleteHost { .. } => "delete_host",
            KitAction::Refresh { .. } => "refresh",
            KitAction::PreEnable { .. } => "pre_enable",
            KitAction::Enable { .. } => "enable",
            KitAction::PostEnable { .. } => "post_enable",
            KitAction::PreDisable { .. } => "pre_disable",
            KitAction::Disable { .. } => "disable",
            KitAction::PostDisable { .. } => "post_disable",
        }
    }

    /// Teardown actions are best-effort: a failing component is logged and
    /// the remaining components still run
    #[must_use]
    pub fn is_teardown(&self) -> bool {
        matches!(
            self,
            KitAction::PreUninstall | KitAction::PostUninstall | KitAction::DeleteHost { .. }
        )
    }

    /// Node names carried by node-list actions
    #[must_use]
    pub fn nodes(&self) -> &[String] {
        match self {
            KitAction::AddHost { nodes, .. }
            | KitAction::PreDeleteHost { nodes, .. }
            | KitAction::DeleteHost { nodes, .. } => nodes,
            _ => &[],
        }
    }
}

impl fmt::Display for KitAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
