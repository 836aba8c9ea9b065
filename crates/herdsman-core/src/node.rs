//! Node lifecycle management
//!
//! Node state transitions, deletion, power control and node queries.
//! Every mutating operation either commits all of its changes or rolls the
//! session back.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::Utc;
use herdsman_adapter::ResourceAdapter;
use herdsman_api::{BootFrom, DeleteNodeResult, NodeSnapshot, NodeState, UpdateNodeRequest};
use herdsman_db::{Location, LockedState, Nic, Node, NodeSpec, ProfileKind, Session};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::addhost::AddHostManager;
use crate::context::CoreContext;
use crate::error::CoreError;

/// Nodes grouped by (hardware profile, software profile)
type ProfileGroups = BTreeMap<(String, Option<String>), Vec<String>>;

/// Node lifecycle manager
#[derive(Debug, Clone)]
pub struct NodeManager {
    ctx: CoreContext,
    add_host: AddHostManager,
}

impl NodeManager {
    pub fn new(ctx: CoreContext, add_host: AddHostManager) -> Self {
        Self { ctx, add_host }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// # Errors
    /// `NodeNotFound` if no node has this name
    pub fn get_node(&self, session: &Session, name: &str) -> Result<NodeSnapshot, CoreError> {
        Ok(session.snapshot(session.node(name)?))
    }

    /// All nodes carrying every tag in `tags`
    pub fn get_node_list(
        &self,
        session: &Session,
        tags: &BTreeMap<String, String>,
    ) -> Vec<NodeSnapshot> {
        session
            .nodes()
            .map(|node| session.snapshot(node))
            .filter(|snapshot| {
                tags.iter()
                    .all(|(name, value)| snapshot.tags.get(name) == Some(value))
            })
            .collect()
    }

    pub fn get_nodes_by_state(&self, session: &Session, state: &NodeState) -> Vec<NodeSnapshot> {
        session
            .nodes_by_state(state, None)
            .iter()
            .map(|node| session.snapshot(node))
            .collect()
    }

    /// Nodes matching a nodespec
    pub fn get_nodes_by_name_filter(
        &self,
        session: &Session,
        nodespec: &str,
        include_installer: bool,
    ) -> Vec<NodeSnapshot> {
        self.expand(session, nodespec, include_installer)
            .iter()
            .map(|node| session.snapshot(node))
            .collect()
    }

    pub fn get_nodes_by_add_host_session(&self, session: &Session, id: Uuid) -> Vec<NodeSnapshot> {
        session
            .nodes_by_add_host_session(id)
            .iter()
            .map(|node| session.snapshot(node))
            .collect()
    }

    fn expand(&self, session: &Session, nodespec: &str, include_installer: bool) -> Vec<Node> {
        let exclude = (!include_installer).then_some(self.ctx.config.installer_hostname.as_str());
        session.expand_nodespec(&NodeSpec::parse(nodespec), exclude)
    }

    fn expand_nonempty(
        &self,
        session: &Session,
        nodespec: &str,
        include_installer: bool,
    ) -> Result<Vec<Node>, CoreError> {
        let nodes = self.expand(session, nodespec, include_installer);
        if nodes.is_empty() {
            return Err(CoreError::NodeNotFound(format!(
                "no nodes matching nodespec [{nodespec}]"
            )));
        }
        Ok(nodes)
    }

    // ========================================================================
    // State transitions
    // ========================================================================

    /// Apply a resource-adapter-specific update to a node
    ///
    /// The first NIC entry of the request, if it carries an IP, becomes the
    /// node's boot interface address. An `Allocated` → `Provisioned`
    /// transition schedules a cluster update.
    ///
    /// # Errors
    /// `NodeNotFound`, `ResourceAdapterNotFound` or the adapter's error
    #[instrument(skip(self, session, request))]
    pub async fn update_node(
        &self,
        session: &mut Session,
        name: &str,
        request: &UpdateNodeRequest,
    ) -> Result<(), CoreError> {
        let result = self.run_update_node(session, name, request).await;
        if let Err(e) = &result {
            warn!(error = %e, "node update failed");
            session.rollback();
        }
        result
    }

    async fn run_update_node(
        &self,
        session: &mut Session,
        name: &str,
        request: &UpdateNodeRequest,
    ) -> Result<(), CoreError> {
        let mut node = session.node(name)?.clone();

        if let Some(ip) = request.nics.first().and_then(|nic| nic.ip.clone()) {
            if node.nics.is_empty() {
                node.nics.push(Nic::default());
            }
            node.nics[0].ip = Some(ip);
            node.nics[0].boot = true;
        }

        let hardware_profile = session.hardware_profile(&node.hardware_profile)?.clone();
        let adapter = self.ctx.resource_adapter(&hardware_profile, None)?;
        adapter.update_node(session, &mut node, request).await?;

        let previous = node.state.clone();
        let mut run_post_install = false;
        if let Some(state) = &request.state {
            run_post_install = is_post_install(&previous, state);
            node.state = state.clone();
        }
        node.last_update = Some(Utc::now());

        *session.node_mut(name)? = node.clone();
        session.commit();

        self.publish_if_changed(session, &node, previous);
        if run_post_install {
            self.ctx.scheduler.schedule_cluster_update("run post-install");
        }

        Ok(())
    }

    /// Record a status report from a node
    ///
    /// `last_update` is always refreshed. Returns whether the state or the
    /// boot device changed.
    ///
    /// # Errors
    /// `NodeNotFound` if no node has this name
    #[instrument(skip(self, session))]
    pub async fn update_node_status(
        &self,
        session: &mut Session,
        name: &str,
        state: Option<NodeState>,
        boot_from: Option<BootFrom>,
    ) -> Result<bool, CoreError> {
        let result = self
            .run_update_node_status(session, name, state, boot_from)
            .await;
        if result.is_err() {
            session.rollback();
        }
        result
    }

    async fn run_update_node_status(
        &self,
        session: &mut Session,
        name: &str,
        state: Option<NodeState>,
        boot_from: Option<BootFrom>,
    ) -> Result<bool, CoreError> {
        let mut node = session.node(name)?.clone();
        let previous = node.state.clone();

        let mut state_changed = false;
        let mut run_post_install = false;
        if let Some(state) = state
            && state != node.state
        {
            run_post_install = is_post_install(&previous, &state);
            node.state = state;
            state_changed = true;
        }

        let mut boot_changed = false;
        if let Some(boot_from) = boot_from
            && boot_from != node.boot_from
        {
            node.boot_from = boot_from;
            boot_changed = true;
        }

        node.last_update = Some(Utc::now());

        if state_changed || boot_changed {
            info!(
                state = %node.state,
                boot_from = %node.boot_from,
                "node status updated"
            );
        }

        if self.manages_boot_config(session, &node)? {
            self.ctx
                .boot
                .write_boot_config(&node, node.boot_from == BootFrom::Disk)
                .await;
        }

        *session.node_mut(name)? = node.clone();
        session.commit();

        self.publish_if_changed(session, &node, previous);
        if run_post_install {
            self.ctx.scheduler.schedule_cluster_update("run post-install");
        }

        Ok(state_changed || boot_changed)
    }

    /// Installer nodes and nodes of remote hardware profiles do not PXE boot
    fn manages_boot_config(&self, session: &Session, node: &Node) -> Result<bool, CoreError> {
        let Some(sw_name) = &node.software_profile else {
            return Ok(false);
        };
        let software_profile = session.software_profile(sw_name)?;
        let hardware_profile = session.hardware_profile(&node.hardware_profile)?;

        Ok(software_profile.kind != ProfileKind::Installer
            && hardware_profile.location != Location::Remote)
    }

    fn publish_if_changed(&self, session: &Session, node: &Node, previous: NodeState) {
        if node.state != previous {
            self.ctx
                .events
                .node_state_changed(session.snapshot(node), previous);
        }
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    /// Delete every node matching `nodespec`
    ///
    /// The installer node is never selected. Profile lock and minimum-node
    /// policies are checked for all affected software profiles before
    /// anything is changed; `force` overrides soft locks.
    ///
    /// # Errors
    /// - `NodeNotFound` if nothing matches
    /// - `OperationFailed` with every policy violation, one per line
    /// - Any kit, adapter or persistence error
    #[instrument(skip(self, session))]
    pub async fn delete_node(
        &self,
        session: &mut Session,
        nodespec: &str,
        force: bool,
    ) -> Result<DeleteNodeResult, CoreError> {
        let nodes = self.expand_nonempty(session, nodespec, false)?;

        let groups = match self.remove_nodes(session, &nodes, force).await {
            Ok(groups) => groups,
            Err(e) => {
                warn!(error = %e, "node deletion failed");
                session.rollback();
                return Err(e);
            }
        };

        for ((hw, sw), names) in &groups {
            if let Err(e) = self
                .ctx
                .kit_actions
                .post_delete_host(session, hw, sw.as_deref(), names)
                .await
            {
                warn!(hardware_profile = %hw, error = %e, "post-delete actions failed");
            }
        }

        let add_host_sessions: Vec<Uuid> = nodes
            .iter()
            .filter_map(|n| n.add_host_session)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        if let Err(e) = self.add_host.delete_sessions(add_host_sessions).await {
            warn!(error = %e, "unable to delete add host sessions");
        }

        for node in &nodes {
            self.ctx.boot.delete_node_cert(&node.name).await;
            self.ctx.boot.node_cleanup(&node.name).await;
        }

        self.ctx.scheduler.schedule_cluster_update("Node(s) deleted");

        let nodes_deleted: Vec<String> = nodes.into_iter().map(|n| n.name).collect();
        info!(count = nodes_deleted.len(), "deleted nodes");

        Ok(DeleteNodeResult { nodes_deleted })
    }

    async fn remove_nodes(
        &self,
        session: &mut Session,
        nodes: &[Node],
        force: bool,
    ) -> Result<ProfileGroups, CoreError> {
        validate_delete(session, nodes, force)?;

        let mut groups = ProfileGroups::new();
        for node in nodes {
            groups
                .entry((node.hardware_profile.clone(), node.software_profile.clone()))
                .or_default()
                .push(node.name.clone());
        }

        for ((hw, sw), names) in &groups {
            self.ctx
                .kit_actions
                .pre_delete_host(session, hw, sw.as_deref(), names)
                .await?;
        }

        let now = Utc::now();
        let mut previous = Vec::with_capacity(nodes.len());
        for node in nodes {
            let record = session.node_mut(&node.name)?;
            previous.push(std::mem::replace(&mut record.state, NodeState::Deleted));
            record.last_update = Some(now);
        }
        session.commit();

        for (node, previous) in nodes.iter().zip(previous) {
            if previous == NodeState::Deleted {
                continue;
            }
            let deleted = session.node(&node.name)?;
            self.ctx
                .events
                .node_state_changed(session.snapshot(deleted), previous);
        }

        for (hw, batch) in group_by_hardware_profile(session, nodes)? {
            let hardware_profile = session.hardware_profile(&hw)?.clone();
            let adapter = self.ctx.resource_adapter(&hardware_profile, None)?;
            adapter.delete_node(&batch).await?;

            for node in &batch {
                let released = session.release_orphaned_tags(&node.name)?;
                if !released.is_empty() {
                    debug!(node = %node.name, tags = released.len(), "released orphaned tags");
                }
                session.remove_node(&node.name)?;
            }
        }
        session.commit();

        Ok(groups)
    }

    // ========================================================================
    // Power control
    // ========================================================================

    /// Power on the nodes matching `nodespec`
    ///
    /// # Errors
    /// `NodeNotFound` if nothing matches, or the adapter's error
    #[instrument(skip(self, session, remaining_nodes))]
    pub async fn startup_node(
        &self,
        session: &mut Session,
        nodespec: &str,
        remaining_nodes: &[String],
        boot_method: BootFrom,
    ) -> Result<(), CoreError> {
        let result: Result<(), CoreError> = async {
            for (adapter, batch) in self.power_targets(session, nodespec)? {
                adapter
                    .startup_node(&batch, remaining_nodes, boot_method)
                    .await?;
            }
            session.commit();
            Ok(())
        }
        .await;

        if result.is_err() {
            session.rollback();
        }
        result
    }

    /// Power off the nodes matching `nodespec`
    ///
    /// # Errors
    /// `NodeNotFound` if nothing matches, or the adapter's error
    #[instrument(skip(self, session))]
    pub async fn shutdown_node(
        &self,
        session: &mut Session,
        nodespec: &str,
        soft_shutdown: bool,
    ) -> Result<(), CoreError> {
        let result: Result<(), CoreError> = async {
            for (adapter, batch) in self.power_targets(session, nodespec)? {
                adapter.shutdown_node(&batch, soft_shutdown).await?;
            }
            session.commit();
            Ok(())
        }
        .await;

        if result.is_err() {
            session.rollback();
        }
        result
    }

    /// Reboot the nodes matching `nodespec`
    ///
    /// With `reinstall`, each node is first switched to network boot.
    ///
    /// # Errors
    /// `NodeNotFound` if nothing matches, or the adapter's error
    #[instrument(skip(self, session))]
    pub async fn reboot_node(
        &self,
        session: &mut Session,
        nodespec: &str,
        soft_reset: bool,
        reinstall: bool,
    ) -> Result<(), CoreError> {
        let result: Result<(), CoreError> = async {
            if reinstall {
                for node in self.expand_nonempty(session, nodespec, true)? {
                    let record = session.node_mut(&node.name)?;
                    self.ctx.boot.set_node_for_network_boot(record).await;
                }
            }

            for (adapter, batch) in self.power_targets(session, nodespec)? {
                adapter.reboot_node(&batch, soft_reset).await?;
            }
            session.commit();
            Ok(())
        }
        .await;

        if result.is_err() {
            session.rollback();
        }
        result
    }

    /// Matching nodes batched per hardware profile, with that profile's adapter
    fn power_targets(
        &self,
        session: &Session,
        nodespec: &str,
    ) -> Result<Vec<(Arc<dyn ResourceAdapter>, Vec<Node>)>, CoreError> {
        let nodes = self.expand_nonempty(session, nodespec, true)?;

        group_by_hardware_profile(session, &nodes)?
            .into_iter()
            .map(|(hw, batch)| -> Result<_, CoreError> {
                let hardware_profile = session.hardware_profile(&hw)?;
                let adapter = self.ctx.resource_adapter(hardware_profile, None)?;
                debug!(hardware_profile = %hw, nodes = batch.len(), "dispatching power action");
                Ok((adapter, batch))
            })
            .collect()
    }
}

fn is_post_install(previous: &NodeState, next: &NodeState) -> bool {
    *previous == NodeState::Allocated && *next == NodeState::Provisioned
}

/// Current records of `nodes`, grouped by hardware profile
fn group_by_hardware_profile(
    session: &Session,
    nodes: &[Node],
) -> Result<BTreeMap<String, Vec<Node>>, CoreError> {
    let mut groups: BTreeMap<String, Vec<Node>> = BTreeMap::new();
    for node in nodes {
        groups
            .entry(node.hardware_profile.clone())
            .or_default()
            .push(session.node(&node.name)?.clone());
    }
    Ok(groups)
}

/// Check lock and minimum-node policies of every affected software profile
fn validate_delete(session: &Session, nodes: &[Node], force: bool) -> Result<(), CoreError> {
    let mut distribution: BTreeMap<&str, usize> = BTreeMap::new();
    for node in nodes {
        if let Some(sw) = &node.software_profile {
            *distribution.entry(sw.as_str()).or_default() += 1;
        }
    }

    let mut errors = Vec::new();
    for (name, count) in distribution {
        let profile = session.software_profile(name)?;

        if profile.locked_state == LockedState::HardLocked {
            errors.push(format!(
                "Nodes cannot be deleted from hard locked software profile [{name}]"
            ));
            continue;
        }

        let min_nodes = profile.min_nodes as usize;
        let current = session.software_profile_node_count(name);
        if min_nodes > 0 && current.saturating_sub(count) < min_nodes {
            if force && profile.locked_state == LockedState::SoftLocked {
                continue;
            }
            errors.push(format!(
                "Software profile [{name}] requires minimum of {min_nodes} nodes; \
                 denied request to delete {count} node(s)"
            ));
            continue;
        }

        if profile.locked_state == LockedState::SoftLocked && !force {
            errors.push(format!(
                "Nodes cannot be deleted from soft locked software profile [{name}]"
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(CoreError::OperationFailed(errors.join("\n")))
    }
}

#[cfg(test)]
mod tests {
    use herdsman_db::{Database, SoftwareProfile};
    use pretty_assertions::assert_eq;

    use super::*;

    async fn seeded(profile: SoftwareProfile, nodes: usize) -> Database {
        let db = Database::new();
        let mut session = db.session().await;
        session
            .insert_hardware_profile(herdsman_db::HardwareProfile::new("hw1", "*"))
            .unwrap();
        let name = profile.name.clone();
        session.insert_software_profile(profile).unwrap();
        for i in 0..nodes {
            session
                .insert_node(Node::new(format!("n{i}"), "hw1").with_software_profile(Some(&name)))
                .unwrap();
        }
        session.commit();
        db
    }

    #[tokio::test]
    async fn test_min_nodes_blocks_delete() {
        let db = seeded(SoftwareProfile::new("sp1").with_min_nodes(2), 2).await;
        let session = db.session().await;
        let nodes = vec![session.node("n0").unwrap().clone()];

        let err = validate_delete(&session, &nodes, false).unwrap_err();
        assert!(matches!(
            err,
            CoreError::OperationFailed(msg)
                if msg == "Software profile [sp1] requires minimum of 2 nodes; denied request to delete 1 node(s)"
        ));

        // force alone does not override the minimum
        assert!(validate_delete(&session, &nodes, true).is_err());
    }

    #[tokio::test]
    async fn test_force_overrides_soft_lock() {
        let profile = SoftwareProfile::new("sp1")
            .with_min_nodes(2)
            .with_locked_state(LockedState::SoftLocked);
        let db = seeded(profile, 2).await;
        let session = db.session().await;
        let nodes = vec![session.node("n0").unwrap().clone()];

        assert!(validate_delete(&session, &nodes, false).is_err());
        assert!(validate_delete(&session, &nodes, true).is_ok());
    }

    #[tokio::test]
    async fn test_hard_lock_cannot_be_forced() {
        let profile = SoftwareProfile::new("sp1").with_locked_state(LockedState::HardLocked);
        let db = seeded(profile, 1).await;
        let session = db.session().await;
        let nodes: Vec<Node> = session.nodes().cloned().collect();

        let err = validate_delete(&session, &nodes, true).unwrap_err();
        assert_eq!(
            err.to_string(),
            "operation failed: Nodes cannot be deleted from hard locked software profile [sp1]"
        );
    }

    #[test]
    fn test_post_install_transition() {
        assert!(is_post_install(&NodeState::Allocated, &NodeState::Provisioned));
        assert!(!is_post_install(&NodeState::Discovered, &NodeState::Provisioned));
        assert!(!is_post_install(&NodeState::Allocated, &NodeState::Installed));
    }
}
