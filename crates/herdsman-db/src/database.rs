//! Transactional store and sessions
//!
//! A [`Session`] holds the store lock for its whole lifetime and works on a
//! private copy of the tables. `commit` publishes the copy, `rollback`
//! discards it, and dropping an uncommitted session behaves like a
//! rollback. Sessions are therefore serialisable: a second session opened
//! while one is live waits until the first is dropped.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::debug;

use crate::models::{
    HardwareProfile, KitRecord, KitSpec, Network, Node, RowId, SoftwareProfile, Tag,
};

/// All rows of the store
#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub(crate) nodes: BTreeMap<String, Node>,
    pub(crate) hardware_profiles: BTreeMap<String, HardwareProfile>,
    pub(crate) software_profiles: BTreeMap<String, SoftwareProfile>,
    pub(crate) networks: BTreeMap<RowId, Network>,
    pub(crate) tags: BTreeMap<RowId, Tag>,
    pub(crate) kits: BTreeMap<KitSpec, KitRecord>,
    /// Per-table row id sequences
    pub(crate) sequences: HashMap<&'static str, RowId>,
}

impl Tables {
    pub(crate) fn next_id(&mut self, table: &'static str) -> RowId {
        let seq = self.sequences.entry(table).or_insert(0);
        *seq += 1;
        *seq
    }
}

/// Shared handle to the store
#[derive(Debug, Clone, Default)]
pub struct Database {
    inner: Arc<Mutex<Tables>>,
}

impl Database {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a session, waiting for any live session to finish
    pub async fn session(&self) -> Session {
        let committed = self.inner.clone().lock_owned().await;
        let working = committed.clone();
        Session { committed, working }
    }
}

/// Unit of work against the store
pub struct Session {
    committed: OwnedMutexGuard<Tables>,
    pub(crate) working: Tables,
}

impl Session {
    /// Publish all staged mutations
    pub fn commit(&mut self) {
        debug!(nodes = self.working.nodes.len(), "session commit");
        *self.committed = self.working.clone();
    }

    /// Discard all mutations staged since the last commit
    pub fn rollback(&mut self) {
        debug!("session rollback");
        self.working = self.committed.clone();
    }

    /// Whether there are staged mutations not yet committed
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.working.nodes != self.committed.nodes
            || self.working.hardware_profiles != self.committed.hardware_profiles
            || self.working.software_profiles != self.committed.software_profiles
            || self.working.networks != self.committed.networks
            || self.working.tags != self.committed.tags
            || self.working.kits != self.committed.kits
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("nodes", &self.working.nodes.len())
            .field("dirty", &self.is_dirty())
            .finish()
    }
}
