//! Installed kit metadata

use crate::database::Session;
use crate::error::DbError;
use crate::models::{KitRecord, KitSpec, RowId};

impl Session {
    /// Installed kit record for a spec
    #[must_use]
    pub fn kit(&self, spec: &KitSpec) -> Option<&KitRecord> {
        self.working.kits.get(spec)
    }

    /// All installed kits, ordered by spec
    pub fn kits(&self) -> impl Iterator<Item = &KitRecord> {
        self.working.kits.values()
    }

    /// Record an installed kit
    ///
    /// # Errors
    /// Returns `KitAlreadyExists` if the spec is already recorded
    pub fn insert_kit(&mut self, mut record: KitRecord) -> Result<RowId, DbError> {
        if self.working.kits.contains_key(&record.spec) {
            return Err(DbError::KitAlreadyExists(record.spec.to_string()));
        }

        let id = self.working.next_id("kits");
        record.id = id;
        self.working.kits.insert(record.spec.clone(), record);

        Ok(id)
    }

    /// Remove an installed kit record
    ///
    /// # Errors
    /// Returns `KitNotFound` if absent, or `IntegrityViolation` if one of its
    /// components is enabled on a software profile
    pub fn remove_kit(&mut self, spec: &KitSpec) -> Result<KitRecord, DbError> {
        if !self.working.kits.contains_key(spec) {
            return Err(DbError::KitNotFound(spec.to_string()));
        }

        if let Some(sp) = self
            .working
            .software_profiles
            .values()
            .find(|sp| sp.components.iter().any(|c| &c.kit == spec))
        {
            return Err(DbError::IntegrityViolation(format!(
                "kit {spec} has components enabled on software profile {}",
                sp.name
            )));
        }

        self.working
            .kits
            .remove(spec)
            .ok_or_else(|| DbError::KitNotFound(spec.to_string()))
    }
}
