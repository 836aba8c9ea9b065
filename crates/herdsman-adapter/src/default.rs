//! The `default` resource adapter
//!
//! Manages bare-metal nodes whose power and boot are handled out of band.
//! Lifecycle events are forwarded to an optional site hook script invoked
//! as `<script> <action> [args] <node,node,...>`.

use std::sync::Arc;

use async_trait::async_trait;
use herdsman_api::{AddHostRequest, NicDefinition, NodeDetails};
use herdsman_db::{HardwareProfile, Location, Nic, Node, RowId, Session, SoftwareProfile};
use herdsman_exec::CommandExecutor;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::addressing::NicAllocator;
use crate::error::AdapterError;
use crate::naming::{HostNamer, validate_host_name};
use crate::traits::ResourceAdapter;

/// Registered name of the built-in adapter
pub const DEFAULT_ADAPTER: &str = "default";

/// Hook-script driven adapter for pre-defined bare-metal nodes
pub struct DefaultAdapter {
    executor: Arc<dyn CommandExecutor>,
    hook_script: Option<String>,
    dns_zone: Option<String>,
    add_host_session: Option<Uuid>,
}

impl DefaultAdapter {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self {
            executor,
            hook_script: None,
            dns_zone: None,
            add_host_session: None,
        }
    }

    /// Script receiving lifecycle events
    #[must_use]
    pub fn with_hook_script(mut self, script: Option<String>) -> Self {
        self.hook_script = script;
        self
    }

    /// Zone appended to generated host names
    #[must_use]
    pub fn with_dns_zone(mut self, zone: Option<String>) -> Self {
        self.dns_zone = zone;
        self
    }

    /// Bind to an add-host session
    #[must_use]
    pub fn with_add_host_session(mut self, session: Option<Uuid>) -> Self {
        self.add_host_session = session;
        self
    }

    /// Whether a node definition carries anything to register
    fn is_predefined(details: &NodeDetails) -> bool {
        details.name.is_some()
            || details
                .nics
                .iter()
                .any(|nic| nic.mac.is_some() || nic.ip.is_some())
    }

    fn build_nics(
        allocator: &mut NicAllocator<'_>,
        session: &Session,
        hardware_profile: &HardwareProfile,
        defs: &[NicDefinition],
    ) -> Result<Vec<Nic>, AdapterError> {
        let provisioning: Option<RowId> = hardware_profile.networks.iter().next().copied();

        let mut nics = defs
            .iter()
            .map(|def| -> Result<Nic, AdapterError> {
                let network = match &def.network {
                    Some(key) => Some(
                        session
                            .network_by_key(key)
                            .map(|n| n.id)
                            .ok_or_else(|| AdapterError::NetworkNotFound(key.clone()))?,
                    ),
                    None => None,
                };

                Ok(Nic {
                    network,
                    device: def.device.clone(),
                    boot: def.boot,
                    ..Nic::default()
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        if nics.is_empty() {
            nics.push(Nic::default());
        }

        // The first interface provisions unless the request picked one
        if !nics.iter().any(|n| n.boot) {
            nics[0].boot = true;
        }
        for nic in nics.iter_mut().filter(|n| n.boot && n.network.is_none()) {
            nic.network = provisioning;
        }

        let validate_ip = hardware_profile.location != Location::Remote;

        for (i, nic) in nics.iter_mut().enumerate() {
            let def = defs.get(i);
            let network = match nic.network {
                Some(id) => Some(
                    session
                        .network(id)
                        .map_err(|e| AdapterError::NetworkNotFound(e.to_string()))?,
                ),
                None => None,
            };

            if let Some(mac) = def.and_then(|d| d.mac.as_deref()) {
                nic.mac = Some(allocator.claim_mac(mac, network)?);
            }

            match (def.and_then(|d| d.ip.as_deref()), network) {
                (Some(ip), Some(network)) if validate_ip => {
                    nic.ip = Some(allocator.claim_ip(ip, network)?.to_string());
                }
                (Some(ip), _) => nic.ip = Some(ip.to_string()),
                (None, Some(network)) if network.is_provisioning() => {
                    nic.ip = allocator.allocate_ip(network)?.map(|ip| ip.to_string());
                }
                (None, _) => {}
            }
        }

        Ok(nics)
    }
}

impl std::fmt::Debug for DefaultAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultAdapter")
            .field("executor", &self.executor.executor_type())
            .field("hook_script", &self.hook_script)
            .field("add_host_session", &self.add_host_session)
            .finish()
    }
}

#[async_trait]
impl ResourceAdapter for DefaultAdapter {
    fn name(&self) -> &str {
        DEFAULT_ADAPTER
    }

    #[instrument(skip_all, fields(hardware_profile = %hardware_profile.name))]
    async fn start(
        &self,
        request: &AddHostRequest,
        session: &Session,
        hardware_profile: &HardwareProfile,
        software_profile: Option<&SoftwareProfile>,
    ) -> Result<Vec<Node>, AdapterError> {
        if !request.node_details.iter().any(Self::is_predefined) {
            return Err(AdapterError::CommandFailed(
                "invalid operation (DHCP discovery)".to_string(),
            ));
        }

        if hardware_profile.location == Location::Local && hardware_profile.networks.is_empty() {
            return Err(AdapterError::NetworkNotFound(format!(
                "hardware profile [{}] does not have a provisioning network",
                hardware_profile.name
            )));
        }

        let mut namer = HostNamer::new(session.nodes().map(|n| n.name.as_str()))
            .with_dns_zone(self.dns_zone.clone());
        let mut allocator = NicAllocator::new(session);
        let session_id = self.add_host_session.unwrap_or(request.add_host_session);

        let mut nodes = Vec::with_capacity(request.node_details.len());
        for details in &request.node_details {
            validate_host_name(details.name.as_deref(), &hardware_profile.name_format)?;

            let name = match &details.name {
                Some(name) => {
                    if session.node(name).is_ok() {
                        return Err(AdapterError::NodeAlreadyExists(name.clone()));
                    }
                    namer.reserve(name);
                    name.clone()
                }
                None => namer.next_name(&hardware_profile.name_format, details.rack)?,
            };

            let mut node = Node::new(name, hardware_profile.name.clone())
                .with_software_profile(software_profile.map(|sp| sp.name.clone()))
                .with_add_host_session(session_id);
            node.rack = details.rack;
            node.nics = Self::build_nics(&mut allocator, session, hardware_profile, &details.nics)?;

            debug!(node = %node.name, nics = node.nics.len(), "initialized new node");
            nodes.push(node);
        }

        info!(count = nodes.len(), "registered pre-defined nodes");

        Ok(nodes)
    }

    async fn delete_node(&self, nodes: &[Node]) -> Result<(), AdapterError> {
        let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();
        self.hook_action("delete", &names, None).await
    }

    async fn reboot_node(&self, nodes: &[Node], soft_reset: bool) -> Result<(), AdapterError> {
        let names: Vec<String> = nodes.iter().map(|n| n.name.clone()).collect();
        let mode = if soft_reset { "soft" } else { "hard" };
        self.hook_action("reset", &names, Some(mode)).await
    }

    #[instrument(skip(self))]
    async fn hook_action(
        &self,
        action: &str,
        nodes: &[String],
        args: Option<&str>,
    ) -> Result<(), AdapterError> {
        let Some(script) = &self.hook_script else {
            debug!("hook script is not defined");
            return Ok(());
        };

        let mut cmd = format!("{script} {action}");
        if let Some(args) = args {
            cmd.push(' ');
            cmd.push_str(args);
        }
        cmd.push(' ');
        cmd.push_str(&nodes.join(","));

        // Hook failures never abort the workflow
        match self.executor.run(&cmd).await {
            Ok(result) if !result.success() => {
                warn!(action, status = result.status, "hook script failed");
            }
            Ok(_) => {}
            Err(e) => warn!(action, error = %e, "hook script could not be run"),
        }

        Ok(())
    }
}
