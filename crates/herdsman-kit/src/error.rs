//! Error types for herdsman-kit

use herdsman_db::DbError;
use herdsman_exec::ExecError;
use thiserror::Error;

/// Errors raised by kit installers and the action dispatcher
#[derive(Error, Debug, Clone)]
pub enum KitError {
    /// No kit registered or installed under this spec
    #[error("kit not found: {0}")]
    KitNotFound(String),

    /// Kit is already installed
    #[error("kit already exists: {0}")]
    KitAlreadyExists(String),

    /// Kit has components enabled on a software profile
    #[error("kit in use: {0}")]
    KitInUse(String),

    /// Kit does not provide the component
    #[error("component not found: {0}")]
    ComponentNotFound(String),

    /// Component cannot be used in this context
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// A component action reported failure
    #[error("{component}: {action} failed: {reason}")]
    ActionFailed {
        /// Component (or kit) name
        component: String,
        /// Action name
        action: &'static str,
        /// Failure detail
        reason: String,
    },

    /// Persistence error
    #[error(transparent)]
    Database(#[from] DbError),

    /// Hook command could not be run
    #[error(transparent)]
    Exec(#[from] ExecError),
}
