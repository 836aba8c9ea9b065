//! Add-host workflow and session tracking

use herdsman_api::{AddHostRequest, AddHostStatus, NodeSnapshot};
use herdsman_db::{Node, Session, SoftwareProfile};
use kameo::actor::{ActorRef, Spawn};
use kameo::error::SendError;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use crate::actor::AddHostSessionActor;
use crate::context::CoreContext;
use crate::error::CoreError;
use crate::message::{
    CreateSession, DeleteSessions, GetStatus, NewSession, UpdateSession, UpdateStatus,
};

/// Creates nodes through resource adapters and tracks add-host sessions
#[derive(Debug, Clone)]
pub struct AddHostManager {
    ctx: CoreContext,
    sessions: ActorRef<AddHostSessionActor>,
}

impl AddHostManager {
    /// Create the manager and spawn its session store
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(ctx: CoreContext) -> Self {
        let sessions = AddHostSessionActor::spawn(());
        Self { ctx, sessions }
    }

    /// Add nodes as described by `request`
    ///
    /// All nodes produced by the resource adapter are persisted in a single
    /// commit; if any step up to and including that commit fails, nothing
    /// is persisted. Returns snapshots of the new nodes.
    ///
    /// # Errors
    /// - `HardwareProfileNotFound` / `SoftwareProfileNotFound`
    /// - `ResourceAdapterNotFound` if the hardware profile has no adapter
    /// - Any adapter, kit or persistence error
    #[instrument(skip_all, fields(
        session = %request.add_host_session,
        hardware_profile = %request.hardware_profile,
    ))]
    pub async fn add_hosts(
        &self,
        session: &mut Session,
        request: &AddHostRequest,
    ) -> Result<Vec<NodeSnapshot>, CoreError> {
        let id = request.add_host_session;
        self.track(id, true).await;
        self.log(id, format!("Adding {} node(s)", request.requested_nodes()))
            .await;

        let result = self.run_add_hosts(session, request).await;

        match &result {
            Ok(nodes) => {
                info!(count = nodes.len(), "added nodes");
                self.log(id, format!("Added {} node(s)", nodes.len())).await;
            }
            Err(e) => {
                error!(error = %e, "add host failed");
                session.rollback();
                self.log(id, format!("Error: {e}")).await;
            }
        }

        self.track(id, false).await;

        result
    }

    async fn run_add_hosts(
        &self,
        session: &mut Session,
        request: &AddHostRequest,
    ) -> Result<Vec<NodeSnapshot>, CoreError> {
        if request.requested_nodes() == 0 {
            return Err(CoreError::InvalidArgument("no nodes requested".to_string()));
        }

        let hardware_profile = session
            .hardware_profile(&request.hardware_profile)?
            .clone();
        let software_profile: Option<SoftwareProfile> = match &request.software_profile {
            Some(name) => Some(session.software_profile(name)?.clone()),
            None => None,
        };

        let adapter = self
            .ctx
            .resource_adapter(&hardware_profile, Some(request.add_host_session))?;
        debug!(adapter = adapter.name(), "starting resource adapter");

        let nodes: Vec<Node> = adapter
            .start(request, session, &hardware_profile, software_profile.as_ref())
            .await?;

        let sw_name = software_profile.as_ref().map(|sp| sp.name.as_str());
        let kit_actions = &self.ctx.kit_actions;

        for node in &nodes {
            let ip = node.boot_nic().and_then(|nic| nic.ip.as_deref());
            kit_actions
                .pre_add_host(session, &hardware_profile.name, sw_name, &node.name, ip)
                .await?;
        }

        let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();
        for node in nodes {
            let name = node.name.clone();
            session.insert_node(node)?;
            if !request.tags.is_empty() {
                session.set_node_tags(&name, &request.tags)?;
            }
            self.log(request.add_host_session, format!("Added node [{name}]"))
                .await;
        }

        session.commit();

        if names.is_empty() {
            return Ok(Vec::new());
        }

        if software_profile.as_ref().is_some_and(|sp| !sp.is_idle) {
            adapter.hook_action("add", &names, None).await?;
            kit_actions
                .post_add_host(session, &hardware_profile.name, sw_name, &names)
                .await?;
            adapter.hook_action("start", &names, None).await?;
        }

        self.ctx.scheduler.schedule_cluster_update("Node(s) added");

        names
            .iter()
            .map(|name| -> Result<NodeSnapshot, CoreError> {
                Ok(session.snapshot(session.node(name)?))
            })
            .collect()
    }

    /// Open a new add-host session
    ///
    /// # Errors
    /// `ActorError` if the session store is unreachable
    pub async fn create_session(&self) -> Result<Uuid, CoreError> {
        let NewSession { id } = self
            .sessions
            .ask(CreateSession)
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))?;
        Ok(id)
    }

    /// Append a progress message; unknown sessions are logged and ignored
    ///
    /// # Errors
    /// `ActorError` if the session store is unreachable
    pub async fn update_status(&self, id: Uuid, message: impl Into<String>) -> Result<(), CoreError> {
        self.sessions
            .ask(UpdateStatus {
                session: id,
                message: message.into(),
            })
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    /// Read a session's progress, optionally with the nodes it created
    ///
    /// # Errors
    /// `InvalidArgument` if the session is unknown
    pub async fn get_status(
        &self,
        session: &Session,
        id: Uuid,
        start_message: usize,
        include_nodes: bool,
    ) -> Result<AddHostStatus, CoreError> {
        let mut status = self
            .sessions
            .ask(GetStatus {
                session: id,
                start_message,
            })
            .await
            .map_err(handler_error)?;

        if include_nodes {
            status.nodes = session
                .nodes_by_add_host_session(id)
                .iter()
                .map(|node| session.snapshot(node))
                .collect();
        }

        Ok(status)
    }

    /// Set a session's running flag
    ///
    /// # Errors
    /// `InvalidArgument` if the session is unknown
    pub async fn update_session(&self, id: Uuid, running: bool) -> Result<(), CoreError> {
        self.sessions
            .ask(UpdateSession {
                session: id,
                running,
            })
            .await
            .map_err(handler_error)
    }

    /// Forget sessions, returning the ids that existed
    ///
    /// # Errors
    /// `ActorError` if the session store is unreachable
    pub async fn delete_sessions(&self, ids: Vec<Uuid>) -> Result<Vec<Uuid>, CoreError> {
        self.sessions
            .ask(DeleteSessions { sessions: ids })
            .await
            .map_err(|e| CoreError::ActorError(e.to_string()))
    }

    async fn log(&self, id: Uuid, message: String) {
        if let Err(e) = self.update_status(id, message).await {
            warn!(session = %id, error = %e, "unable to record session status");
        }
    }

    async fn track(&self, id: Uuid, running: bool) {
        if let Err(e) = self.update_session(id, running).await {
            debug!(session = %id, error = %e, "add host session is not tracked");
        }
    }
}

fn handler_error<M>(err: SendError<M, CoreError>) -> CoreError {
    match err {
        SendError::HandlerError(e) => e,
        other => CoreError::ActorError(other.to_string()),
    }
}
