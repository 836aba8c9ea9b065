//! herdsman-adapter: Resource adapter contract and built-in adapters
//!
//! A resource adapter provisions and deprovisions the actual machines behind
//! a hardware profile. Adapters are looked up by name through an
//! [`AdapterRegistry`] populated once at startup.

pub mod addressing;
pub mod default;
pub mod error;
pub mod naming;
pub mod registry;
pub mod traits;

pub use addressing::{NicAllocator, Subnet, normalize_mac};
pub use default::{DEFAULT_ADAPTER, DefaultAdapter};
pub use error::AdapterError;
pub use naming::{HostNamer, validate_host_name};
pub use registry::{AdapterFactory, AdapterRegistry};
pub use traits::ResourceAdapter;
