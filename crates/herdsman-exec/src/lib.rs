//! herdsman-exec: Command execution abstraction
//!
//! Runs hook scripts and cluster-update commands on the installer node.

pub mod error;
pub mod local;
pub mod result;
pub mod traits;

pub use error::ExecError;
pub use local::LocalExecutor;
pub use result::CommandResult;
pub use traits::CommandExecutor;
