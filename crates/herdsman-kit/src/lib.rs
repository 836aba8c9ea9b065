//! herdsman-kit: Kits, components and lifecycle action dispatch
//!
//! Kits are versioned plugin packages made of components. Components hook
//! into node lifecycle events through [`KitAction`]s; the
//! [`KitActionsManager`] fans each event out to every component enabled on
//! at least one software profile.

pub mod action;
pub mod base;
pub mod dispatcher;
pub mod error;
pub mod manager;
pub mod registry;
pub mod traits;

pub use action::KitAction;
pub use base::{BASE_KIT, BaseKit, BaseKitConfig};
pub use dispatcher::{BaseKitOrder, KitActionsManager};
pub use error::KitError;
pub use manager::KitManager;
pub use registry::KitRegistry;
pub use traits::{ComponentInstaller, KitInstaller};
