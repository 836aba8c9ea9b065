//! Error types for herdsman-adapter

use herdsman_exec::ExecError;
use thiserror::Error;

/// Errors raised by resource adapters
#[derive(Error, Debug, Clone)]
pub enum AdapterError {
    /// No adapter registered under this name
    #[error("resource adapter not registered: {0}")]
    NotRegistered(String),

    /// Operation not implemented by this adapter
    #[error("resource adapter {adapter} does not support {operation}")]
    Unsupported {
        /// Adapter name
        adapter: String,
        /// Operation that was requested
        operation: &'static str,
    },

    /// Hardware profile and request disagree
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Malformed argument (name format, NIC definition, ...)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Referenced network does not exist
    #[error("network not found: {0}")]
    NetworkNotFound(String),

    /// MAC address is malformed
    #[error("invalid MAC address: {0}")]
    InvalidMacAddress(String),

    /// MAC address already used on the same network
    #[error("MAC address already exists: {0}")]
    MacAddressAlreadyExists(String),

    /// Requested host name is taken
    #[error("node already exists: {0}")]
    NodeAlreadyExists(String),

    /// Backend refused the operation
    #[error("command failed: {0}")]
    CommandFailed(String),

    /// Local command could not be run
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl AdapterError {
    /// Shorthand for [`AdapterError::Unsupported`]
    pub fn unsupported(adapter: impl Into<String>, operation: &'static str) -> Self {
        AdapterError::Unsupported {
            adapter: adapter.into(),
            operation,
        }
    }
}
