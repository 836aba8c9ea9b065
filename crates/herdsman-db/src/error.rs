//! Error types for herdsman-db

use thiserror::Error;

/// Errors raised by the persistence gateway
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DbError {
    /// Node not found
    #[error("node not found: {0}")]
    NodeNotFound(String),

    /// Node name already in use
    #[error("node already exists: {0}")]
    NodeAlreadyExists(String),

    /// Hardware profile not found
    #[error("hardware profile not found: {0}")]
    HardwareProfileNotFound(String),

    /// Hardware profile name already in use
    #[error("hardware profile already exists: {0}")]
    HardwareProfileAlreadyExists(String),

    /// Software profile not found
    #[error("software profile not found: {0}")]
    SoftwareProfileNotFound(String),

    /// Software profile name already in use
    #[error("software profile already exists: {0}")]
    SoftwareProfileAlreadyExists(String),

    /// Network not found
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    /// Network address/netmask already in use
    #[error("network already exists: {0}")]
    NetworkAlreadyExists(String),

    /// Kit record not found
    #[error("kit not found: {0}")]
    KitNotFound(String),

    /// Kit record already present
    #[error("kit already exists: {0}")]
    KitAlreadyExists(String),

    /// Row is still referenced by another row
    #[error("integrity violation: {0}")]
    IntegrityViolation(String),
}
