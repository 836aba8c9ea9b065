//! Hardware and software profile access

use std::collections::BTreeSet;

use crate::database::Session;
use crate::error::DbError;
use crate::models::{HardwareProfile, RowId, SoftwareProfile};

impl Session {
    /// Get a hardware profile by name
    ///
    /// # Errors
    /// Returns `HardwareProfileNotFound` if absent
    pub fn hardware_profile(&self, name: &str) -> Result<&HardwareProfile, DbError> {
        self.working
            .hardware_profiles
            .get(name)
            .ok_or_else(|| DbError::HardwareProfileNotFound(name.to_string()))
    }

    /// All hardware profiles, ordered by name
    pub fn hardware_profiles(&self) -> impl Iterator<Item = &HardwareProfile> {
        self.working.hardware_profiles.values()
    }

    /// Insert a hardware profile
    ///
    /// # Errors
    /// Fails if the name is taken or a referenced network is missing
    pub fn insert_hardware_profile(
        &mut self,
        mut profile: HardwareProfile,
    ) -> Result<RowId, DbError> {
        if self.working.hardware_profiles.contains_key(&profile.name) {
            return Err(DbError::HardwareProfileAlreadyExists(profile.name));
        }

        if let Some(missing) = profile
            .networks
            .iter()
            .find(|id| !self.working.networks.contains_key(id))
        {
            return Err(DbError::NetworkNotFound(missing.to_string()));
        }

        let id = self.working.next_id("hardware_profiles");
        profile.id = id;
        self.working
            .hardware_profiles
            .insert(profile.name.clone(), profile);

        Ok(id)
    }

    /// Get a software profile by name
    ///
    /// # Errors
    /// Returns `SoftwareProfileNotFound` if absent
    pub fn software_profile(&self, name: &str) -> Result<&SoftwareProfile, DbError> {
        self.working
            .software_profiles
            .get(name)
            .ok_or_else(|| DbError::SoftwareProfileNotFound(name.to_string()))
    }

    /// Get a software profile by name for mutation
    ///
    /// # Errors
    /// Returns `SoftwareProfileNotFound` if absent
    pub fn software_profile_mut(&mut self, name: &str) -> Result<&mut SoftwareProfile, DbError> {
        self.working
            .software_profiles
            .get_mut(name)
            .ok_or_else(|| DbError::SoftwareProfileNotFound(name.to_string()))
    }

    /// All software profiles, ordered by name
    pub fn software_profiles(&self) -> impl Iterator<Item = &SoftwareProfile> {
        self.working.software_profiles.values()
    }

    /// Insert a software profile
    ///
    /// # Errors
    /// Returns `SoftwareProfileAlreadyExists` if the name is taken
    pub fn insert_software_profile(
        &mut self,
        mut profile: SoftwareProfile,
    ) -> Result<RowId, DbError> {
        if self.working.software_profiles.contains_key(&profile.name) {
            return Err(DbError::SoftwareProfileAlreadyExists(profile.name));
        }

        let id = self.working.next_id("software_profiles");
        profile.id = id;
        self.working
            .software_profiles
            .insert(profile.name.clone(), profile);

        Ok(id)
    }

    /// Names of components enabled on at least one software profile
    ///
    /// Evaluated against the session's current view on every call.
    #[must_use]
    pub fn enabled_component_names(&self) -> BTreeSet<String> {
        self.working
            .software_profiles
            .values()
            .flat_map(|sp| sp.components.iter().map(|c| c.name.clone()))
            .collect()
    }
}
