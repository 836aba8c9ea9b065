//! Kit installation and removal

use std::sync::Arc;

use herdsman_db::{DbError, KitRecord, KitSpec, Session};
use tracing::{error, info, instrument, warn};

use crate::action::KitAction;
use crate::error::KitError;
use crate::registry::KitRegistry;
use crate::traits::KitInstaller;

/// Installs registered kits into the store and removes them again
#[derive(Debug, Clone)]
pub struct KitManager {
    registry: Arc<KitRegistry>,
}

impl KitManager {
    pub fn new(registry: Arc<KitRegistry>) -> Self {
        Self { registry }
    }

    /// Install the registered kit `spec`
    ///
    /// Runs `pre_install`, records the kit and its components, runs
    /// `post_install` and commits. On failure the session is rolled back
    /// and the kit's uninstall actions run as best-effort cleanup.
    ///
    /// # Errors
    /// `KitNotFound` if no installer is registered, `KitAlreadyExists` if
    /// the kit is already installed, or the failing action's error
    #[instrument(skip(self, session), fields(kit = %spec))]
    pub async fn install_kit(
        &self,
        session: &mut Session,
        spec: &KitSpec,
    ) -> Result<KitRecord, KitError> {
        let installer = self.registry.get(spec)?;

        if session.kit(spec).is_some() {
            return Err(KitError::KitAlreadyExists(spec.to_string()));
        }

        match Self::run_install(installer.as_ref(), session).await {
            Ok(record) => {
                info!(components = record.components.len(), "installed kit");
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, "kit installation failed, rolling back");
                session.rollback();
                run_best_effort(installer.as_ref(), &KitAction::PreUninstall).await;
                run_best_effort(installer.as_ref(), &KitAction::PostUninstall).await;
                Err(e)
            }
        }
    }

    async fn run_install(
        installer: &dyn KitInstaller,
        session: &mut Session,
    ) -> Result<KitRecord, KitError> {
        installer.run_action(&KitAction::PreInstall).await?;

        let mut record = installer.record();
        record.id = session.insert_kit(record.clone())?;

        installer.run_action(&KitAction::PostInstall).await?;
        session.commit();

        Ok(record)
    }

    /// Remove the installed kit `spec`
    ///
    /// `pre_uninstall` and `post_uninstall` are best-effort. With `force`,
    /// the kit's components are first removed from every software profile.
    ///
    /// # Errors
    /// `KitNotFound` if the kit is not installed, `KitInUse` if one of its
    /// components is enabled and `force` is not set
    #[instrument(skip(self, session), fields(kit = %spec))]
    pub async fn uninstall_kit(
        &self,
        session: &mut Session,
        spec: &KitSpec,
        force: bool,
    ) -> Result<KitRecord, KitError> {
        if session.kit(spec).is_none() {
            return Err(KitError::KitNotFound(spec.to_string()));
        }

        let profiles: Vec<String> = session
            .software_profiles()
            .filter(|sp| sp.components.iter().any(|c| &c.kit == spec))
            .map(|sp| sp.name.clone())
            .collect();

        if !profiles.is_empty() {
            if !force {
                return Err(KitError::KitInUse(format!(
                    "{spec} has components enabled on software profiles: {}",
                    profiles.join(", ")
                )));
            }

            for name in &profiles {
                let profile = session.software_profile_mut(name)?;
                profile.components.retain(|c| &c.kit != spec);
                warn!(software_profile = %name, "force-disabled kit components");
            }
        }

        // The installer may be gone if the kit was registered by an older build
        let installer = self.registry.get(spec).ok();

        if let Some(installer) = &installer {
            run_best_effort(installer.as_ref(), &KitAction::PreUninstall).await;
        }

        let record = match session.remove_kit(spec) {
            Ok(record) => record,
            Err(DbError::IntegrityViolation(msg)) => {
                session.rollback();
                return Err(KitError::KitInUse(msg));
            }
            Err(e) => {
                session.rollback();
                return Err(e.into());
            }
        };
        session.commit();

        if let Some(installer) = &installer {
            run_best_effort(installer.as_ref(), &KitAction::PostUninstall).await;
        }

        info!("uninstalled kit");

        Ok(record)
    }
}

async fn run_best_effort(installer: &dyn KitInstaller, action: &KitAction) {
    if let Err(e) = installer.run_action(action).await {
        warn!(kit = %installer.spec(), action = %action, error = %e, "kit action failed");
    }
}
