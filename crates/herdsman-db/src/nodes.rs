//! Node queries and mutations

use herdsman_api::{NicSnapshot, NodeSnapshot, NodeState};
use uuid::Uuid;

use crate::database::Session;
use crate::error::DbError;
use crate::models::{Node, RowId};
use crate::nodespec::{NodeSpec, host_part};

impl Session {
    /// Get a node by name
    ///
    /// # Errors
    /// Returns `NodeNotFound` if no such node exists
    pub fn node(&self, name: &str) -> Result<&Node, DbError> {
        self.working
            .nodes
            .get(name)
            .ok_or_else(|| DbError::NodeNotFound(name.to_string()))
    }

    /// Get a node by name for mutation
    ///
    /// # Errors
    /// Returns `NodeNotFound` if no such node exists
    pub fn node_mut(&mut self, name: &str) -> Result<&mut Node, DbError> {
        self.working
            .nodes
            .get_mut(name)
            .ok_or_else(|| DbError::NodeNotFound(name.to_string()))
    }

    /// All nodes, ordered by name
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.working.nodes.values()
    }

    /// Insert a new node row, assigning its id
    ///
    /// # Errors
    /// Fails if the name is taken or a referenced profile/network is missing
    pub fn insert_node(&mut self, mut node: Node) -> Result<RowId, DbError> {
        if self.working.nodes.contains_key(&node.name) {
            return Err(DbError::NodeAlreadyExists(node.name));
        }

        if !self
            .working
            .hardware_profiles
            .contains_key(&node.hardware_profile)
        {
            return Err(DbError::HardwareProfileNotFound(node.hardware_profile));
        }

        if let Some(ref swp) = node.software_profile
            && !self.working.software_profiles.contains_key(swp)
        {
            return Err(DbError::SoftwareProfileNotFound(swp.clone()));
        }

        for network in node.nics.iter().filter_map(|n| n.network) {
            if !self.working.networks.contains_key(&network) {
                return Err(DbError::NetworkNotFound(network.to_string()));
            }
        }

        let id = self.working.next_id("nodes");
        node.id = id;
        self.working.nodes.insert(node.name.clone(), node);

        Ok(id)
    }

    /// Remove a node row
    ///
    /// # Errors
    /// Returns `NodeNotFound` if no such node exists
    pub fn remove_node(&mut self, name: &str) -> Result<Node, DbError> {
        self.working
            .nodes
            .remove(name)
            .ok_or_else(|| DbError::NodeNotFound(name.to_string()))
    }

    /// Nodes selected by a nodespec, optionally excluding the installer
    ///
    /// The installer is recognised by host part, so `installer.cluster` is
    /// excluded for an installer host name of `installer`.
    #[must_use]
    pub fn expand_nodespec(&self, spec: &NodeSpec, exclude: Option<&str>) -> Vec<Node> {
        self.working
            .nodes
            .values()
            .filter(|n| spec.matches(&n.name))
            .filter(|n| {
                exclude.is_none_or(|installer| host_part(&n.name) != host_part(installer))
            })
            .cloned()
            .collect()
    }

    /// Nodes produced by an add-host session
    #[must_use]
    pub fn nodes_by_add_host_session(&self, session: Uuid) -> Vec<Node> {
        self.working
            .nodes
            .values()
            .filter(|n| n.add_host_session == Some(session))
            .cloned()
            .collect()
    }

    /// Nodes in the given state, optionally limited to one software profile
    #[must_use]
    pub fn nodes_by_state(&self, state: &NodeState, software_profile: Option<&str>) -> Vec<Node> {
        self.working
            .nodes
            .values()
            .filter(|n| &n.state == state)
            .filter(|n| {
                software_profile.is_none_or(|swp| n.software_profile.as_deref() == Some(swp))
            })
            .cloned()
            .collect()
    }

    /// Number of nodes assigned to a software profile
    #[must_use]
    pub fn software_profile_node_count(&self, software_profile: &str) -> usize {
        self.working
            .nodes
            .values()
            .filter(|n| n.software_profile.as_deref() == Some(software_profile))
            .count()
    }

    /// Build an API snapshot of a node, resolving tags and networks
    #[must_use]
    pub fn snapshot(&self, node: &Node) -> NodeSnapshot {
        let nics = node
            .nics
            .iter()
            .map(|nic| NicSnapshot {
                mac: nic.mac.clone(),
                ip: nic.ip.clone(),
                network: nic
                    .network
                    .and_then(|id| self.working.networks.get(&id))
                    .map(crate::models::Network::key),
                device: nic.device.clone(),
                boot: nic.boot,
            })
            .collect();

        NodeSnapshot {
            name: node.name.clone(),
            state: node.state.clone(),
            rack: node.rack,
            add_host_session: node.add_host_session,
            boot_from: node.boot_from,
            last_update: node.last_update,
            hardware_profile: node.hardware_profile.clone(),
            software_profile: node.software_profile.clone(),
            nics,
            tags: self.tag_map(&node.tags),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::database::Database;
    use crate::models::{HardwareProfile, Nic, Node, SoftwareProfile};
    use crate::{DbError, NodeSpec};

    async fn seeded() -> Database {
        let db = Database::new();
        let mut session = db.session().await;
        session
            .insert_hardware_profile(HardwareProfile::new("hw1", "*"))
            .unwrap();
        session
            .insert_software_profile(SoftwareProfile::new("sp1"))
            .unwrap();
        session.commit();
        db
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = seeded().await;
        let mut session = db.session().await;

        let id = session
            .insert_node(Node::new("node1", "hw1").with_software_profile(Some("sp1")))
            .unwrap();

        assert_eq!(id, 1);
        assert_eq!(session.node("node1").unwrap().id, 1);
        assert_eq!(session.software_profile_node_count("sp1"), 1);
    }

    #[tokio::test]
    async fn test_duplicate_name_rejected() {
        let db = seeded().await;
        let mut session = db.session().await;

        session.insert_node(Node::new("node1", "hw1")).unwrap();
        let err = session.insert_node(Node::new("node1", "hw1")).unwrap_err();

        assert_eq!(err, DbError::NodeAlreadyExists("node1".to_string()));
    }

    #[tokio::test]
    async fn test_missing_references_rejected() {
        let db = seeded().await;
        let mut session = db.session().await;

        let err = session.insert_node(Node::new("node1", "nope")).unwrap_err();
        assert!(matches!(err, DbError::HardwareProfileNotFound(_)));

        let err = session
            .insert_node(Node::new("node1", "hw1").with_software_profile(Some("nope")))
            .unwrap_err();
        assert!(matches!(err, DbError::SoftwareProfileNotFound(_)));

        let nic = Nic {
            network: Some(42),
            ..Nic::default()
        };
        let err = session
            .insert_node(Node::new("node1", "hw1").with_nic(nic))
            .unwrap_err();
        assert!(matches!(err, DbError::NetworkNotFound(_)));
    }

    #[tokio::test]
    async fn test_expand_nodespec_excludes_installer() {
        let db = seeded().await;
        let mut session = db.session().await;

        for name in ["installer", "node1", "node2"] {
            session.insert_node(Node::new(name, "hw1")).unwrap();
        }

        let all = session.expand_nodespec(&NodeSpec::parse("*"), None);
        assert_eq!(all.len(), 3);

        let names: Vec<_> = session
            .expand_nodespec(&NodeSpec::parse("*"), Some("installer"))
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["node1", "node2"]);
    }

    #[tokio::test]
    async fn test_expand_nodespec_excludes_qualified_installer() {
        let db = seeded().await;
        let mut session = db.session().await;

        for name in ["installer.cluster", "node1.cluster"] {
            session.insert_node(Node::new(name, "hw1")).unwrap();
        }

        let names: Vec<_> = session
            .expand_nodespec(&NodeSpec::parse("*"), Some("installer"))
            .into_iter()
            .map(|n| n.name)
            .collect();
        assert_eq!(names, vec!["node1.cluster"]);

        assert!(
            session
                .expand_nodespec(&NodeSpec::parse("installer"), Some("installer"))
                .is_empty()
        );
    }
}
