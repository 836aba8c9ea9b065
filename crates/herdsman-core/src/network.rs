//! Network management

use herdsman_db::{DbError, Network, RowId, Session};
use tracing::{info, instrument};

use crate::error::CoreError;

/// Adds and removes networks
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkManager;

impl NetworkManager {
    pub fn new() -> Self {
        Self
    }

    pub fn get_network_list(&self, session: &Session) -> Vec<Network> {
        session.networks().cloned().collect()
    }

    /// Look up a network by its `address/netmask` key
    ///
    /// # Errors
    /// `NetworkNotFound`
    pub fn get_network(&self, session: &Session, key: &str) -> Result<Network, CoreError> {
        session
            .network_by_key(key)
            .cloned()
            .ok_or_else(|| CoreError::NetworkNotFound(key.to_string()))
    }

    /// # Errors
    /// `NetworkAlreadyExists` if a network with the same address and
    /// netmask exists
    #[instrument(skip(self, session, network), fields(network = %network.key()))]
    pub fn add_network(&self, session: &mut Session, network: Network) -> Result<RowId, CoreError> {
        match session.insert_network(network) {
            Ok(id) => {
                session.commit();
                info!(id, "added network");
                Ok(id)
            }
            Err(e) => {
                session.rollback();
                Err(e.into())
            }
        }
    }

    /// # Errors
    /// `NetworkNotFound`, or `NetworkInUse` while a hardware profile or NIC
    /// references the network
    #[instrument(skip(self, session))]
    pub fn delete_network(&self, session: &mut Session, id: RowId) -> Result<Network, CoreError> {
        match session.remove_network(id) {
            Ok(network) => {
                session.commit();
                info!(network = %network.key(), "deleted network");
                Ok(network)
            }
            Err(DbError::IntegrityViolation(msg)) => {
                session.rollback();
                Err(CoreError::NetworkInUse(msg))
            }
            Err(e) => {
                session.rollback();
                Err(e.into())
            }
        }
    }
}
