//! Resource adapter contract

use async_trait::async_trait;
use herdsman_api::{AddHostRequest, BootFrom, UpdateNodeRequest};
use herdsman_db::{HardwareProfile, Node, Session, SoftwareProfile};

use crate::error::AdapterError;

/// Backend that provisions the machines of a hardware profile
///
/// Node-list operations receive every node of one hardware profile in a
/// single call so backends can batch. Operations a backend cannot perform
/// keep the default implementation, which reports them as unsupported.
#[async_trait]
pub trait ResourceAdapter: Send + Sync {
    /// Registered adapter name
    fn name(&self) -> &str;

    /// Create node entities for an add-host request
    ///
    /// The returned nodes are not yet persisted; the caller inserts them
    /// into `session` and commits.
    async fn start(
        &self,
        request: &AddHostRequest,
        session: &Session,
        hardware_profile: &HardwareProfile,
        software_profile: Option<&SoftwareProfile>,
    ) -> Result<Vec<Node>, AdapterError>;

    /// Apply a backend-specific update to a node before its state changes
    async fn update_node(
        &self,
        _session: &Session,
        _node: &mut Node,
        _request: &UpdateNodeRequest,
    ) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Release the backing resources of `nodes`
    async fn delete_node(&self, _nodes: &[Node]) -> Result<(), AdapterError> {
        Ok(())
    }

    /// Power on `nodes`
    ///
    /// `remaining` lists names of nodes from the same request handled by
    /// other adapters.
    async fn startup_node(
        &self,
        _nodes: &[Node],
        _remaining: &[String],
        _boot_method: BootFrom,
    ) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported(self.name(), "startup"))
    }

    /// Power off `nodes`
    async fn shutdown_node(&self, _nodes: &[Node], _soft: bool) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported(self.name(), "shutdown"))
    }

    /// Reboot `nodes`
    async fn reboot_node(&self, _nodes: &[Node], _soft_reset: bool) -> Result<(), AdapterError> {
        Err(AdapterError::unsupported(self.name(), "reboot"))
    }

    /// Notify the backend of a lifecycle event (`add`, `start`, `delete`, ...)
    async fn hook_action(
        &self,
        _action: &str,
        _nodes: &[String],
        _args: Option<&str>,
    ) -> Result<(), AdapterError> {
        Ok(())
    }
}
