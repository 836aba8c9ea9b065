//! herdsman-db: Session/persistence gateway
//!
//! An in-memory, transactional store of nodes, profiles, networks, tags
//! and installed kits. All access goes through a [`Session`]; mutations are
//! staged on the session and become visible to other sessions only on
//! [`Session::commit`].

pub mod database;
pub mod error;
pub mod models;
pub mod nodespec;

mod kits;
mod networks;
mod nodes;
mod profiles;
mod tags;

pub use database::{Database, Session};
pub use error::DbError;
pub use models::{
    ComponentRecord, ComponentRef, HardwareProfile, KitRecord, KitSpec, Location, LockedState,
    Network, Nic, Node, ProfileKind, RowId, SoftwareProfile, Tag,
};
pub use nodespec::{NodeSpec, host_part};
