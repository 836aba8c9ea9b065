//! Core error types for herdsman-core

use herdsman_adapter::AdapterError;
use herdsman_db::DbError;
use herdsman_kit::KitError;
use thiserror::Error;

/// Errors surfaced by the orchestration core
#[derive(Error, Debug, Clone)]
pub enum CoreError {
    /// No node matched
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Hardware profile does not exist
    #[error("hardware profile not found: {0}")]
    HardwareProfileNotFound(String),

    /// Software profile does not exist
    #[error("software profile not found: {0}")]
    SoftwareProfileNotFound(String),

    /// Kit is neither registered nor installed
    #[error("kit not found: {0}")]
    KitNotFound(String),

    /// Kit does not provide the component
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// Network does not exist
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    /// Hardware profile has no usable resource adapter
    #[error("resource adapter not found: {0}")]
    ResourceAdapterNotFound(String),

    /// Request conflicts with profile configuration
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Operation refused by policy
    #[error("operation failed: {0}")]
    OperationFailed(String),

    /// Malformed or unknown argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Network with the same address/netmask exists
    #[error("network already exists: {0}")]
    NetworkAlreadyExists(String),

    /// Kit is already installed
    #[error("kit already exists: {0}")]
    KitAlreadyExists(String),

    /// Node name is taken
    #[error("node already exists: {0}")]
    NodeAlreadyExists(String),

    /// Malformed MAC address in a NIC definition
    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),

    /// MAC address already used on the same network
    #[error("MAC address already exists: {0}")]
    MacAddressAlreadyExists(String),

    /// Network is still referenced
    #[error("network in use: {0}")]
    NetworkInUse(String),

    /// Kit components are still enabled
    #[error("kit in use: {0}")]
    KitInUse(String),

    /// Resource adapter failure
    #[error("resource adapter error: {0}")]
    Adapter(AdapterError),

    /// Kit or component action failure
    #[error("kit error: {0}")]
    Kit(KitError),

    /// Persistence failure
    #[error("database error: {0}")]
    Database(DbError),

    /// Actor communication error
    #[error("actor communication error: {0}")]
    ActorError(String),
}

impl From<DbError> for CoreError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NodeNotFound(s) => CoreError::NodeNotFound(s),
            DbError::NodeAlreadyExists(s) => CoreError::NodeAlreadyExists(s),
            DbError::HardwareProfileNotFound(s) => CoreError::HardwareProfileNotFound(s),
            DbError::SoftwareProfileNotFound(s) => CoreError::SoftwareProfileNotFound(s),
            DbError::NetworkNotFound(s) => CoreError::NetworkNotFound(s),
            DbError::NetworkAlreadyExists(s) => CoreError::NetworkAlreadyExists(s),
            DbError::KitNotFound(s) => CoreError::KitNotFound(s),
            DbError::KitAlreadyExists(s) => CoreError::KitAlreadyExists(s),
            other => CoreError::Database(other),
        }
    }
}

impl From<AdapterError> for CoreError {
    fn from(err: AdapterError) -> Self {
        match err {
            AdapterError::NotRegistered(s) => CoreError::ResourceAdapterNotFound(s),
            AdapterError::ConfigurationError(s) => CoreError::ConfigurationError(s),
            AdapterError::InvalidArgument(s) => CoreError::InvalidArgument(s),
            AdapterError::NetworkNotFound(s) => CoreError::NetworkNotFound(s),
            AdapterError::NodeAlreadyExists(s) => CoreError::NodeAlreadyExists(s),
            AdapterError::InvalidMacAddress(s) => CoreError::InvalidMacAddress(s),
            AdapterError::MacAddressAlreadyExists(s) => CoreError::MacAddressAlreadyExists(s),
            other => CoreError::Adapter(other),
        }
    }
}

impl From<KitError> for CoreError {
    fn from(err: KitError) -> Self {
        match err {
            KitError::KitNotFound(s) => CoreError::KitNotFound(s),
            KitError::KitAlreadyExists(s) => CoreError::KitAlreadyExists(s),
            KitError::KitInUse(s) => CoreError::KitInUse(s),
            KitError::ComponentNotFound(s) => CoreError::ComponentNotFound(s),
            KitError::ConfigurationError(s) => CoreError::ConfigurationError(s),
            KitError::Database(db) => db.into(),
            other => CoreError::Kit(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_conditions_survive_conversion() {
        let err: CoreError = DbError::NodeNotFound("n1".to_string()).into();
        assert!(matches!(err, CoreError::NodeNotFound(s) if s == "n1"));

        let err: CoreError = AdapterError::NotRegistered("aws".to_string()).into();
        assert!(matches!(err, CoreError::ResourceAdapterNotFound(_)));

        let err: CoreError =
            AdapterError::MacAddressAlreadyExists("52:54:00:00:00:01".to_string()).into();
        assert!(matches!(err, CoreError::MacAddressAlreadyExists(_)));

        let err: CoreError = KitError::Database(DbError::KitNotFound("k-1-0".to_string())).into();
        assert!(matches!(err, CoreError::KitNotFound(_)));
    }

    #[test]
    fn test_other_errors_are_wrapped() {
        let err: CoreError = DbError::IntegrityViolation("x".to_string()).into();
        assert!(matches!(err, CoreError::Database(_)));

        let err: CoreError = AdapterError::unsupported("default", "startup").into();
        assert!(matches!(err, CoreError::Adapter(_)));
    }
}
