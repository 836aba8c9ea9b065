//! End-to-end tests of the add-host and node lifecycle workflows

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use herdsman_adapter::{AdapterError, AdapterRegistry, DEFAULT_ADAPTER, DefaultAdapter, ResourceAdapter};
use herdsman_api::{
    AddHostRequest, BootFrom, ClusterEvent, NicDefinition, NodeDetails, NodeState, UpdateNodeRequest,
};
use herdsman_core::*;
use herdsman_db::{
    ComponentRef, Database, HardwareProfile, KitSpec, LockedState, Network, Node, Session,
    SoftwareProfile,
};
use herdsman_exec::LocalExecutor;
use herdsman_kit::{ComponentInstaller, KitAction, KitError, KitInstaller, KitRegistry};
use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use tokio::sync::broadcast;
use uuid::Uuid;

// ============================================================================
// Test doubles
// ============================================================================

#[derive(Default)]
struct RecordingScheduler {
    reasons: Mutex<Vec<String>>,
}

impl ClusterUpdateScheduler for RecordingScheduler {
    fn schedule_cluster_update(&self, reason: &str) {
        self.reasons.lock().push(reason.to_string());
    }
}

#[derive(Default)]
struct RecordingBoot {
    calls: Mutex<Vec<String>>,
}

#[async_trait]
impl BootHostManager for RecordingBoot {
    async fn set_node_for_network_boot(&self, node: &mut Node) {
        node.boot_from = BootFrom::Network;
        self.calls.lock().push(format!("netboot {}", node.name));
    }

    async fn write_boot_config(&self, node: &Node, local_boot: bool) {
        self.calls
            .lock()
            .push(format!("bootconfig {} {local_boot}", node.name));
    }

    async fn delete_node_cert(&self, name: &str) {
        self.calls.lock().push(format!("cert {name}"));
    }

    async fn node_cleanup(&self, name: &str) {
        self.calls.lock().push(format!("cleanup {name}"));
    }
}

/// Creates one `Allocated` node per named node definition
#[derive(Default)]
struct MockAdapter {
    hooks: Mutex<Vec<String>>,
    deleted: Mutex<Vec<String>>,
    rebooted: Mutex<Vec<String>>,
    fail_delete: Mutex<bool>,
}

#[async_trait]
impl ResourceAdapter for MockAdapter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn start(
        &self,
        request: &AddHostRequest,
        _session: &Session,
        hardware_profile: &HardwareProfile,
        software_profile: Option<&SoftwareProfile>,
    ) -> Result<Vec<Node>, AdapterError> {
        request
            .node_details
            .iter()
            .map(|details| -> Result<Node, AdapterError> {
                let name = details.name.clone().ok_or_else(|| {
                    AdapterError::InvalidArgument("mock adapter needs node names".to_string())
                })?;
                Ok(Node::new(name, hardware_profile.name.clone())
                    .with_software_profile(software_profile.map(|sp| sp.name.clone()))
                    .with_state(NodeState::Allocated)
                    .with_add_host_session(request.add_host_session))
            })
            .collect()
    }

    async fn delete_node(&self, nodes: &[Node]) -> Result<(), AdapterError> {
        if *self.fail_delete.lock() {
            return Err(AdapterError::CommandFailed("backend unreachable".to_string()));
        }
        self.deleted
            .lock()
            .extend(nodes.iter().map(|n| n.name.clone()));
        Ok(())
    }

    async fn reboot_node(&self, nodes: &[Node], _soft_reset: bool) -> Result<(), AdapterError> {
        self.rebooted
            .lock()
            .extend(nodes.iter().map(|n| n.name.clone()));
        Ok(())
    }

    async fn hook_action(
        &self,
        action: &str,
        nodes: &[String],
        _args: Option<&str>,
    ) -> Result<(), AdapterError> {
        self.hooks
            .lock()
            .push(format!("{action} {}", nodes.join(",")));
        Ok(())
    }
}

type ActionLog = Arc<Mutex<Vec<String>>>;

/// `component:action` that should fail
type FailOn = Arc<Mutex<Option<String>>>;

#[derive(Clone, Default)]
struct KitLogs {
    actions: ActionLog,
    node_lists: ActionLog,
    fail_on: FailOn,
}

struct RecordingComponent {
    name: &'static str,
    logs: KitLogs,
}

#[async_trait]
impl ComponentInstaller for RecordingComponent {
    fn name(&self) -> &str {
        self.name
    }

    fn version(&self) -> &str {
        "1.0"
    }

    async fn run_action(&self, action: &KitAction) -> Result<(), KitError> {
        let key = format!("{}:{}", self.name, action.name());
        if !action.nodes().is_empty() {
            self.logs
                .node_lists
                .lock()
                .push(format!("{key} {}", action.nodes().join(",")));
        }
        self.logs.actions.lock().push(key.clone());

        if self.logs.fail_on.lock().as_deref() == Some(key.as_str()) {
            return Err(KitError::ActionFailed {
                component: self.name.to_string(),
                action: action.name(),
                reason: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

struct RecordingKit {
    spec: KitSpec,
    component: Arc<RecordingComponent>,
}

impl RecordingKit {
    fn new(name: &str, component: &'static str, logs: &KitLogs) -> Self {
        Self {
            spec: KitSpec::new(name, "1.0", "0"),
            component: Arc::new(RecordingComponent {
                name: component,
                logs: logs.clone(),
            }),
        }
    }
}

impl KitInstaller for RecordingKit {
    fn spec(&self) -> &KitSpec {
        &self.spec
    }

    fn components(&self) -> Vec<Arc<dyn ComponentInstaller>> {
        vec![self.component.clone()]
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    cluster: Cluster,
    adapter: Arc<MockAdapter>,
    scheduler: Arc<RecordingScheduler>,
    boot: Arc<RecordingBoot>,
    kit_log: ActionLog,
    kit_nodes: ActionLog,
    kit_fail_on: FailOn,
    events: broadcast::Receiver<ClusterEvent>,
}

impl Fixture {
    async fn new(software_profile: SoftwareProfile) -> Self {
        let logs = KitLogs::default();
        let monitoring = RecordingKit::new("monitoring", "monitor", &logs);
        let base = RecordingKit::new("base", "dns", &logs);

        let db = Database::new();
        {
            let mut session = db.session().await;
            let net = session
                .insert_network(Network::new("10.0.0.0", "255.255.255.0"))
                .unwrap();

            let mut hw = HardwareProfile::new("hw1", "compute-#NN").with_resource_adapter("mock");
            hw.networks.insert(net);
            session.insert_hardware_profile(hw).unwrap();
            session
                .insert_hardware_profile(HardwareProfile::new("unmanaged", "*"))
                .unwrap();

            let mut sp = software_profile;
            sp.components.insert(ComponentRef {
                kit: base.spec.clone(),
                name: "dns".to_string(),
            });
            sp.components.insert(ComponentRef {
                kit: monitoring.spec.clone(),
                name: "monitor".to_string(),
            });
            session.insert_software_profile(sp).unwrap();

            session.insert_node(Node::new("installer", "hw1")).unwrap();
            session.commit();
        }

        // registration order puts the base kit last
        let kits = Arc::new(KitRegistry::new());
        kits.register(Arc::new(monitoring));
        kits.register(Arc::new(base));

        let adapter = Arc::new(MockAdapter::default());
        let adapters = Arc::new(AdapterRegistry::new());
        let mock = adapter.clone();
        let factory = move |_session: Option<Uuid>| -> Arc<dyn ResourceAdapter> { mock.clone() };
        adapters.register("mock", Arc::new(factory));

        let scheduler = Arc::new(RecordingScheduler::default());
        let boot = Arc::new(RecordingBoot::default());
        let ctx = CoreContext::new(
            Arc::new(CoreConfig::default()),
            adapters,
            kits,
            boot.clone(),
            scheduler.clone(),
        );
        let cluster = Cluster::new(db, ctx);
        let events = cluster.subscribe();

        Self {
            cluster,
            adapter,
            scheduler,
            boot,
            kit_log: logs.actions,
            kit_nodes: logs.node_lists,
            kit_fail_on: logs.fail_on,
            events,
        }
    }

    async fn add(&self, names: &[&str]) -> Result<Vec<String>, CoreError> {
        let mut request = AddHostRequest::new("hw1", Uuid::new_v4()).with_software_profile("sp1");
        for name in names {
            request = request.with_node(named(name));
        }

        let mut session = self.cluster.database().session().await;
        let nodes = self
            .cluster
            .add_host()
            .add_hosts(&mut session, &request)
            .await?;
        Ok(nodes.into_iter().map(|n| n.name).collect())
    }

    fn drain_events(&mut self) -> Vec<(String, NodeState, NodeState)> {
        let mut events = Vec::new();
        while let Ok(ClusterEvent::NodeStateChanged {
            node,
            previous_state,
        }) = self.events.try_recv()
        {
            events.push((node.name, previous_state, node.state));
        }
        events
    }
}

fn named(name: &str) -> NodeDetails {
    NodeDetails {
        name: Some(name.to_string()),
        rack: None,
        nics: vec![NicDefinition {
            mac: Some("52:54:00:12:34:56".to_string()),
            ..NicDefinition::default()
        }],
    }
}

fn reasons(fixture: &Fixture) -> Vec<String> {
    fixture.scheduler.reasons.lock().clone()
}

// ============================================================================
// Add host
// ============================================================================

#[tokio::test]
async fn test_add_hosts_runs_base_kit_first() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;

    let names = fixture.add(&["node1"]).await.unwrap();

    assert_eq!(names, vec!["node1"]);
    assert_eq!(
        *fixture.kit_log.lock(),
        vec![
            "dns:pre_add_host",
            "monitor:pre_add_host",
            "dns:add_host",
            "monitor:add_host",
        ]
    );
    assert_eq!(*fixture.adapter.hooks.lock(), vec!["add node1", "start node1"]);
    assert_eq!(reasons(&fixture), vec!["Node(s) added"]);
}

#[tokio::test]
async fn test_idle_profile_skips_post_add() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1").idle()).await;

    fixture.add(&["node1"]).await.unwrap();

    assert_eq!(
        *fixture.kit_log.lock(),
        vec!["dns:pre_add_host", "monitor:pre_add_host"]
    );
    assert!(fixture.adapter.hooks.lock().is_empty());
}

#[tokio::test]
async fn test_add_hosts_is_atomic() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node2"]).await.unwrap();

    let err = fixture.add(&["node1", "node2"]).await.unwrap_err();

    assert!(matches!(err, CoreError::NodeAlreadyExists(name) if name == "node2"));
    let session = fixture.cluster.database().session().await;
    assert!(session.node("node1").is_err());
    assert_eq!(reasons(&fixture), vec!["Node(s) added"]);
}

#[tokio::test]
async fn test_add_hosts_requires_resource_adapter() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    let request = AddHostRequest::new("unmanaged", Uuid::new_v4()).with_node(named("node1"));

    let mut session = fixture.cluster.database().session().await;
    let err = fixture
        .cluster
        .add_host()
        .add_hosts(&mut session, &request)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::ResourceAdapterNotFound(msg)
            if msg == "resource adapter not defined for hardware profile [unmanaged]"
    ));
}

#[tokio::test]
async fn test_add_host_session_reports_progress() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    let add_host = fixture.cluster.add_host();
    let id = add_host.create_session().await.unwrap();

    let request = AddHostRequest::new("hw1", id)
        .with_software_profile("sp1")
        .with_node(named("node1"))
        .with_tag("rack", "a1");
    let mut session = fixture.cluster.database().session().await;
    add_host.add_hosts(&mut session, &request).await.unwrap();

    let status = add_host.get_status(&session, id, 0, true).await.unwrap();
    assert!(!status.running);
    assert_eq!(status.messages.first().map(String::as_str), Some("Adding 1 node(s)"));
    assert_eq!(status.nodes.len(), 1);
    assert_eq!(status.nodes[0].tags.get("rack").map(String::as_str), Some("a1"));

    let later = add_host
        .get_status(&session, id, status.messages.len(), false)
        .await
        .unwrap();
    assert!(later.messages.is_empty());
    assert!(later.nodes.is_empty());

    // deleting the session's nodes forgets the session
    fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap();
    let err = add_host.get_status(&session, id, 0, false).await.unwrap_err();
    assert!(matches!(err, CoreError::InvalidArgument(_)));
}

// ============================================================================
// Delete
// ============================================================================

#[tokio::test]
async fn test_delete_below_min_nodes_is_refused() {
    let mut fixture = Fixture::new(SoftwareProfile::new("sp1").with_min_nodes(2)).await;
    fixture.add(&["node1", "node2"]).await.unwrap();
    fixture.drain_events();

    let mut session = fixture.cluster.database().session().await;
    let err = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::OperationFailed(_)));
    assert!(session.node("node1").is_ok());
    assert!(fixture.adapter.deleted.lock().is_empty());
    assert!(fixture.drain_events().is_empty());
}

#[tokio::test]
async fn test_force_deletes_from_soft_locked_profile() {
    let profile = SoftwareProfile::new("sp1")
        .with_min_nodes(2)
        .with_locked_state(LockedState::SoftLocked);
    let mut fixture = Fixture::new(profile).await;
    fixture.add(&["node1", "node2"]).await.unwrap();
    fixture.drain_events();
    fixture.kit_log.lock().clear();

    let mut session = fixture.cluster.database().session().await;
    let nodes = fixture.cluster.nodes();

    let err = nodes
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::OperationFailed(_)));

    let result = nodes.delete_node(&mut session, "node1", true).await.unwrap();

    assert_eq!(result.nodes_deleted, vec!["node1"]);
    assert!(session.node("node1").is_err());
    assert_eq!(*fixture.adapter.deleted.lock(), vec!["node1"]);
    assert_eq!(
        fixture.drain_events(),
        vec![(
            "node1".to_string(),
            NodeState::Allocated,
            NodeState::Deleted
        )]
    );
    assert_eq!(
        *fixture.kit_log.lock(),
        vec![
            "monitor:pre_delete_host",
            "dns:pre_delete_host",
            "monitor:delete_host",
            "dns:delete_host",
        ]
    );
    assert_eq!(
        *fixture.boot.calls.lock(),
        vec!["cert node1", "cleanup node1"]
    );
    assert_eq!(reasons(&fixture).last().map(String::as_str), Some("Node(s) deleted"));
}

#[tokio::test]
async fn test_hard_locked_profile_refuses_delete() {
    let profile = SoftwareProfile::new("sp1").with_locked_state(LockedState::HardLocked);
    let fixture = Fixture::new(profile).await;
    fixture.add(&["node1"]).await.unwrap();

    let mut session = fixture.cluster.database().session().await;
    let err = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", true)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        CoreError::OperationFailed(msg)
            if msg == "Nodes cannot be deleted from hard locked software profile [sp1]"
    ));
    assert_eq!(session.node("node1").unwrap().state, NodeState::Allocated);
}

#[tokio::test]
async fn test_delete_never_selects_installer() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;

    let mut session = fixture.cluster.database().session().await;
    let err = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "installer", false)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::NodeNotFound(_)));
    assert!(session.node("installer").is_ok());
}

#[tokio::test]
async fn test_default_adapter_add_then_delete() {
    let db = Database::new();
    {
        let mut session = db.session().await;
        let net = session
            .insert_network(Network::new("10.0.0.0", "255.255.255.0"))
            .unwrap();
        let mut hw = HardwareProfile::new("hw1", "*").with_resource_adapter(DEFAULT_ADAPTER);
        hw.networks.insert(net);
        session.insert_hardware_profile(hw).unwrap();
        session.commit();
    }

    let adapters = Arc::new(AdapterRegistry::new());
    let factory = |session: Option<Uuid>| -> Arc<dyn ResourceAdapter> {
        Arc::new(DefaultAdapter::new(Arc::new(LocalExecutor::new())).with_add_host_session(session))
    };
    adapters.register(DEFAULT_ADAPTER, Arc::new(factory));
    let ctx = CoreContext::new(
        Arc::new(CoreConfig::default()),
        adapters,
        Arc::new(KitRegistry::new()),
        Arc::new(RecordingBoot::default()),
        Arc::new(RecordingScheduler::default()),
    );
    let cluster = Cluster::new(db, ctx);

    let request = AddHostRequest::new("hw1", Uuid::new_v4()).with_node(named("node1"));
    let mut session = cluster.database().session().await;
    let nodes = cluster
        .add_host()
        .add_hosts(&mut session, &request)
        .await
        .unwrap();

    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].name, "node1");
    assert_eq!(nodes[0].state, NodeState::Discovered);
    assert_eq!(nodes[0].software_profile, None);
    assert_eq!(nodes[0].nics[0].ip.as_deref(), Some("10.0.0.1"));
    assert_eq!(nodes[0].nics[0].mac.as_deref(), Some("52:54:00:12:34:56"));

    let result = cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap();
    assert_eq!(result.nodes_deleted, vec!["node1"]);
    assert!(session.node("node1").is_err());
}

#[tokio::test]
async fn test_adapter_delete_failure_keeps_deleted_checkpoint() {
    let mut fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1", "node2"]).await.unwrap();
    fixture.drain_events();
    *fixture.adapter.fail_delete.lock() = true;

    let mut session = fixture.cluster.database().session().await;
    let err = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Adapter(AdapterError::CommandFailed(_))));
    assert_eq!(session.node("node1").unwrap().state, NodeState::Deleted);
    assert_eq!(session.node("node2").unwrap().state, NodeState::Allocated);
    assert_eq!(
        fixture.drain_events(),
        vec![(
            "node1".to_string(),
            NodeState::Allocated,
            NodeState::Deleted
        )]
    );
    assert_eq!(reasons(&fixture), vec!["Node(s) added"]);
    assert!(fixture.boot.calls.lock().is_empty());

    // the stranded node rides along with the next deletion's kit actions
    *fixture.adapter.fail_delete.lock() = false;
    fixture.kit_nodes.lock().clear();
    fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node2", false)
        .await
        .unwrap();

    assert_eq!(
        *fixture.kit_nodes.lock(),
        vec![
            "monitor:pre_delete_host node1,node2",
            "dns:pre_delete_host node1,node2",
            "monitor:delete_host node1,node2",
            "dns:delete_host node1,node2",
        ]
    );
    assert!(session.node("node2").is_err());

    let result = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap();
    assert_eq!(result.nodes_deleted, vec!["node1"]);
    assert!(session.node("node1").is_err());
    assert_eq!(*fixture.adapter.deleted.lock(), vec!["node2", "node1"]);
    assert_eq!(
        fixture.drain_events(),
        vec![(
            "node2".to_string(),
            NodeState::Allocated,
            NodeState::Deleted
        )]
    );
}

#[tokio::test]
async fn test_pre_delete_failure_rolls_back() {
    let mut fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1"]).await.unwrap();
    fixture.drain_events();
    *fixture.kit_fail_on.lock() = Some("dns:pre_delete_host".to_string());

    let mut session = fixture.cluster.database().session().await;
    let err = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap_err();

    assert!(matches!(err, CoreError::Kit(KitError::ActionFailed { .. })));
    assert_eq!(session.node("node1").unwrap().state, NodeState::Allocated);
    assert!(fixture.drain_events().is_empty());
    assert!(fixture.adapter.deleted.lock().is_empty());
}

#[tokio::test]
async fn test_delete_host_failure_after_commit_is_not_fatal() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1"]).await.unwrap();
    *fixture.kit_fail_on.lock() = Some("monitor:delete_host".to_string());
    fixture.kit_log.lock().clear();

    let mut session = fixture.cluster.database().session().await;
    let result = fixture
        .cluster
        .nodes()
        .delete_node(&mut session, "node1", false)
        .await
        .unwrap();

    assert_eq!(result.nodes_deleted, vec!["node1"]);
    assert!(session.node("node1").is_err());
    assert_eq!(
        *fixture.kit_log.lock(),
        vec![
            "monitor:pre_delete_host",
            "dns:pre_delete_host",
            "monitor:delete_host",
            "dns:delete_host",
        ]
    );
    assert_eq!(
        *fixture.boot.calls.lock(),
        vec!["cert node1", "cleanup node1"]
    );
    assert_eq!(reasons(&fixture), vec!["Node(s) added", "Node(s) deleted"]);
}

// ============================================================================
// State transitions
// ============================================================================

#[tokio::test]
async fn test_provisioned_status_schedules_post_install_once() {
    let mut fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1"]).await.unwrap();
    fixture.drain_events();

    let mut session = fixture.cluster.database().session().await;
    let nodes = fixture.cluster.nodes();

    let changed = nodes
        .update_node_status(&mut session, "node1", Some(NodeState::Provisioned), None)
        .await
        .unwrap();
    assert!(changed);

    let current_boot = session.node("node1").unwrap().boot_from;
    let changed = nodes
        .update_node_status(
            &mut session,
            "node1",
            Some(NodeState::Provisioned),
            Some(current_boot),
        )
        .await
        .unwrap();
    assert!(!changed);

    let changed = nodes
        .update_node_status(
            &mut session,
            "node1",
            Some(NodeState::Provisioned),
            Some(BootFrom::Disk),
        )
        .await
        .unwrap();
    assert!(changed);

    assert_eq!(
        fixture.drain_events(),
        vec![(
            "node1".to_string(),
            NodeState::Allocated,
            NodeState::Provisioned
        )]
    );
    assert_eq!(reasons(&fixture), vec!["Node(s) added", "run post-install"]);
    assert_eq!(
        *fixture.boot.calls.lock(),
        vec![
            "bootconfig node1 false",
            "bootconfig node1 false",
            "bootconfig node1 true",
        ]
    );
    assert_eq!(session.node("node1").unwrap().boot_from, BootFrom::Disk);
    assert!(session.node("node1").unwrap().last_update.is_some());
}

#[tokio::test]
async fn test_update_node_sets_boot_address() {
    let mut fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1"]).await.unwrap();
    fixture.drain_events();

    let request = UpdateNodeRequest {
        state: Some(NodeState::Installed),
        nics: vec![NicDefinition {
            ip: Some("10.0.0.15".to_string()),
            ..NicDefinition::default()
        }],
        metadata: BTreeMap::new(),
    };
    let mut session = fixture.cluster.database().session().await;
    fixture
        .cluster
        .nodes()
        .update_node(&mut session, "node1", &request)
        .await
        .unwrap();

    let node = fixture.cluster.nodes().get_node(&session, "node1").unwrap();
    assert_eq!(node.state, NodeState::Installed);
    assert_eq!(node.nics[0].ip.as_deref(), Some("10.0.0.15"));
    assert!(node.nics[0].boot);
    assert_eq!(fixture.drain_events().len(), 1);
    assert_eq!(reasons(&fixture), vec!["Node(s) added"]);
}

#[tokio::test]
async fn test_reinstall_switches_to_network_boot() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1", "node2"]).await.unwrap();

    let mut session = fixture.cluster.database().session().await;
    fixture
        .cluster
        .nodes()
        .reboot_node(&mut session, "node*", false, true)
        .await
        .unwrap();

    assert_eq!(*fixture.adapter.rebooted.lock(), vec!["node1", "node2"]);
    assert_eq!(
        *fixture.boot.calls.lock(),
        vec!["netboot node1", "netboot node2"]
    );

    let err = fixture
        .cluster
        .nodes()
        .shutdown_node(&mut session, "node*", true)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Adapter(_)));
}

#[tokio::test]
async fn test_node_queries() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    fixture.add(&["node1", "node2"]).await.unwrap();

    let session = fixture.cluster.database().session().await;
    let nodes = fixture.cluster.nodes();

    let all: Vec<_> = nodes
        .get_nodes_by_name_filter(&session, "*", false)
        .into_iter()
        .map(|n| n.name)
        .collect();
    assert_eq!(all, vec!["node1", "node2"]);
    assert_eq!(nodes.get_nodes_by_name_filter(&session, "*", true).len(), 3);
    assert_eq!(
        nodes
            .get_nodes_by_state(&session, &NodeState::Allocated)
            .len(),
        2
    );
    assert!(matches!(
        nodes.get_node(&session, "node9"),
        Err(CoreError::NodeNotFound(_))
    ));
}

// ============================================================================
// Components and networks
// ============================================================================

#[tokio::test]
async fn test_enable_component_is_idempotent() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    let spec = KitSpec::new("monitoring", "1.0", "0");
    let mut session = fixture.cluster.database().session().await;
    session
        .insert_software_profile(SoftwareProfile::new("sp2"))
        .unwrap();
    session.commit();

    let profiles = fixture.cluster.software_profiles();
    let err = profiles
        .enable_component(&mut session, "sp2", &spec, "monitor")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::KitNotFound(_)));

    fixture
        .cluster
        .kits()
        .install_kit(&mut session, &spec)
        .await
        .unwrap();
    fixture.kit_log.lock().clear();

    profiles
        .enable_component(&mut session, "sp2", &spec, "monitor")
        .await
        .unwrap();
    profiles
        .enable_component(&mut session, "sp2", &spec, "monitor")
        .await
        .unwrap();

    assert_eq!(
        *fixture.kit_log.lock(),
        vec!["monitor:pre_enable", "monitor:enable", "monitor:post_enable"]
    );
    assert_eq!(session.software_profile("sp2").unwrap().components.len(), 1);

    let err = profiles
        .enable_component(&mut session, "sp2", &spec, "grafana")
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ComponentNotFound(_)));

    profiles
        .disable_component(&mut session, "sp2", &spec, "monitor")
        .await
        .unwrap();
    assert!(session.software_profile("sp2").unwrap().components.is_empty());
}

#[tokio::test]
async fn test_network_in_use_cannot_be_deleted() {
    let fixture = Fixture::new(SoftwareProfile::new("sp1")).await;
    let networks = fixture.cluster.networks();
    let mut session = fixture.cluster.database().session().await;

    let used = networks
        .get_network(&session, "10.0.0.0/255.255.255.0")
        .unwrap();
    let err = networks.delete_network(&mut session, used.id).unwrap_err();
    assert!(matches!(err, CoreError::NetworkInUse(_)));

    let err = networks
        .add_network(&mut session, Network::new("10.0.0.0", "255.255.255.0"))
        .unwrap_err();
    assert!(matches!(err, CoreError::NetworkAlreadyExists(_)));

    let id = networks
        .add_network(&mut session, Network::new("192.168.1.0", "255.255.255.0"))
        .unwrap();
    networks.delete_network(&mut session, id).unwrap();
    assert_eq!(networks.get_network_list(&session).len(), 1);
}
