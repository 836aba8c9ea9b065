//! Tag rows and their garbage collection
//!
//! Tags are shared rows keyed by `(name, value)`. A tag is orphaned once no
//! node, hardware profile or software profile references it.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::database::Session;
use crate::error::DbError;
use crate::models::{RowId, Tag};

impl Session {
    /// Look up a tag row by id
    #[must_use]
    pub fn tag(&self, id: RowId) -> Option<&Tag> {
        self.working.tags.get(&id)
    }

    /// Find or create the tag row for `(name, value)`
    pub fn tag_id(&mut self, name: &str, value: &str) -> RowId {
        if let Some(tag) = self
            .working
            .tags
            .values()
            .find(|t| t.name == name && t.value == value)
        {
            return tag.id;
        }

        let id = self.working.next_id("tags");
        self.working.tags.insert(
            id,
            Tag {
                id,
                name: name.to_string(),
                value: value.to_string(),
            },
        );
        id
    }

    /// Resolve tag ids into a name/value map
    #[must_use]
    pub fn tag_map(&self, ids: &BTreeSet<RowId>) -> BTreeMap<String, String> {
        ids.iter()
            .filter_map(|id| self.working.tags.get(id))
            .map(|t| (t.name.clone(), t.value.clone()))
            .collect()
    }

    /// Replace the tags of a node with `tags`
    ///
    /// Tags dropped from the node are released if nothing else uses them.
    ///
    /// # Errors
    /// Returns `NodeNotFound` if the node does not exist
    pub fn set_node_tags(
        &mut self,
        node: &str,
        tags: &BTreeMap<String, String>,
    ) -> Result<(), DbError> {
        let ids: BTreeSet<RowId> = tags
            .iter()
            .map(|(name, value)| self.tag_id(name, value))
            .collect();

        let row = self.node_mut(node)?;
        let dropped: Vec<RowId> = row.tags.difference(&ids).copied().collect();
        row.tags = ids;

        for id in dropped {
            self.release_tag_if_orphaned(id);
        }

        Ok(())
    }

    /// Remove tags of `node` that no other node or profile references
    ///
    /// Must be called while the node row still exists. Returns the removed
    /// tag rows.
    ///
    /// # Errors
    /// Returns `NodeNotFound` if the node does not exist
    pub fn release_orphaned_tags(&mut self, node: &str) -> Result<Vec<Tag>, DbError> {
        let row = self.node(node)?;
        let candidates: Vec<RowId> = row.tags.iter().copied().collect();
        let owner = row.name.clone();

        let mut released = Vec::new();
        for id in candidates {
            if self.tag_references(id, Some(&owner)) == 0
                && let Some(tag) = self.working.tags.remove(&id)
            {
                debug!(tag = %tag.name, value = %tag.value, "releasing orphaned tag");
                released.push(tag);
            }
        }

        Ok(released)
    }

    fn release_tag_if_orphaned(&mut self, id: RowId) {
        if self.tag_references(id, None) == 0 {
            self.working.tags.remove(&id);
        }
    }

    /// Count references to a tag, ignoring the node named `except`
    fn tag_references(&self, id: RowId, except: Option<&str>) -> usize {
        let nodes = self
            .working
            .nodes
            .values()
            .filter(|n| except != Some(n.name.as_str()) && n.tags.contains(&id))
            .count();
        let hardware = self
            .working
            .hardware_profiles
            .values()
            .filter(|p| p.tags.contains(&id))
            .count();
        let software = self
            .working
            .software_profiles
            .values()
            .filter(|p| p.tags.contains(&id))
            .count();

        nodes + hardware + software
    }
}
