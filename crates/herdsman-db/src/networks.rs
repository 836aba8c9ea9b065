//! Network rows

use crate::database::Session;
use crate::error::DbError;
use crate::models::{Network, RowId};

impl Session {
    /// Get a network by id
    ///
    /// # Errors
    /// Returns `NetworkNotFound` if absent
    pub fn network(&self, id: RowId) -> Result<&Network, DbError> {
        self.working
            .networks
            .get(&id)
            .ok_or_else(|| DbError::NetworkNotFound(id.to_string()))
    }

    /// Find a network by its `address/netmask` key
    #[must_use]
    pub fn network_by_key(&self, key: &str) -> Option<&Network> {
        self.working.networks.values().find(|n| n.key() == key)
    }

    /// All networks, ordered by id
    pub fn networks(&self) -> impl Iterator<Item = &Network> {
        self.working.networks.values()
    }

    /// Insert a network
    ///
    /// # Errors
    /// Returns `NetworkAlreadyExists` if the address/netmask is taken
    pub fn insert_network(&mut self, mut network: Network) -> Result<RowId, DbError> {
        if self.network_by_key(&network.key()).is_some() {
            return Err(DbError::NetworkAlreadyExists(network.key()));
        }

        let id = self.working.next_id("networks");
        network.id = id;
        self.working.networks.insert(id, network);

        Ok(id)
    }

    /// Remove a network
    ///
    /// # Errors
    /// Returns `NetworkNotFound` if absent, or `IntegrityViolation` if a
    /// hardware profile or NIC still references it
    pub fn remove_network(&mut self, id: RowId) -> Result<Network, DbError> {
        let network = self.network(id)?;

        if let Some(hp) = self
            .working
            .hardware_profiles
            .values()
            .find(|hp| hp.networks.contains(&id))
        {
            return Err(DbError::IntegrityViolation(format!(
                "network {} referenced by hardware profile {}",
                network.key(),
                hp.name
            )));
        }

        if let Some(node) = self
            .working
            .nodes
            .values()
            .find(|n| n.nics.iter().any(|nic| nic.network == Some(id)))
        {
            return Err(DbError::IntegrityViolation(format!(
                "network {} referenced by node {}",
                network.key(),
                node.name
            )));
        }

        self.working
            .networks
            .remove(&id)
            .ok_or_else(|| DbError::NetworkNotFound(id.to_string()))
    }
}
