//! Software profile component management

use std::sync::Arc;

use herdsman_db::{ComponentRef, KitSpec, Session};
use herdsman_kit::{ComponentInstaller, KitAction};
use tracing::{debug, info, instrument, warn};

use crate::context::CoreContext;
use crate::error::CoreError;

/// Enables and disables kit components on software profiles
#[derive(Debug, Clone)]
pub struct SoftwareProfileManager {
    ctx: CoreContext,
}

impl SoftwareProfileManager {
    pub fn new(ctx: CoreContext) -> Self {
        Self { ctx }
    }

    /// Enable `component` of the installed kit `kit` on a software profile
    ///
    /// Runs the component's `pre_enable`, `enable` and `post_enable`
    /// actions. Enabling an already enabled component is a no-op.
    ///
    /// # Errors
    /// - `SoftwareProfileNotFound`
    /// - `KitNotFound` if the kit is not installed
    /// - `ComponentNotFound` if the kit has no such component
    /// - `ConfigurationError` if the component cannot run on this profile
    #[instrument(skip(self, session), fields(kit = %kit))]
    pub async fn enable_component(
        &self,
        session: &mut Session,
        software_profile: &str,
        kit: &KitSpec,
        component: &str,
    ) -> Result<(), CoreError> {
        let result = self
            .run_enable(session, software_profile, kit, component)
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "unable to enable component");
            session.rollback();
        }
        result
    }

    async fn run_enable(
        &self,
        session: &mut Session,
        software_profile: &str,
        kit: &KitSpec,
        component: &str,
    ) -> Result<(), CoreError> {
        let profile = session.software_profile(software_profile)?.clone();
        let installer = self.component_installer(session, kit, component)?;

        let component_ref = ComponentRef {
            kit: kit.clone(),
            name: component.to_string(),
        };
        if profile.components.contains(&component_ref) {
            debug!("component already enabled");
            return Ok(());
        }

        installer.check_enableable(&profile)?;

        let name = profile.name.clone();
        installer
            .run_action(&KitAction::PreEnable {
                software_profile: name.clone(),
            })
            .await?;

        session
            .software_profile_mut(software_profile)?
            .components
            .insert(component_ref);

        installer
            .run_action(&KitAction::Enable {
                software_profile: name.clone(),
            })
            .await?;
        installer
            .run_action(&KitAction::PostEnable {
                software_profile: name,
            })
            .await?;

        session.commit();
        info!("enabled component");

        Ok(())
    }

    /// Disable `component` of `kit` on a software profile
    ///
    /// Runs the component's `pre_disable`, `disable` and `post_disable`
    /// actions. Disabling a component that is not enabled is a no-op.
    ///
    /// # Errors
    /// `SoftwareProfileNotFound`, `KitNotFound` or `ComponentNotFound`
    #[instrument(skip(self, session), fields(kit = %kit))]
    pub async fn disable_component(
        &self,
        session: &mut Session,
        software_profile: &str,
        kit: &KitSpec,
        component: &str,
    ) -> Result<(), CoreError> {
        let result = self
            .run_disable(session, software_profile, kit, component)
            .await;
        if let Err(e) = &result {
            warn!(error = %e, "unable to disable component");
            session.rollback();
        }
        result
    }

    async fn run_disable(
        &self,
        session: &mut Session,
        software_profile: &str,
        kit: &KitSpec,
        component: &str,
    ) -> Result<(), CoreError> {
        let profile = session.software_profile(software_profile)?.clone();
        let installer = self.component_installer(session, kit, component)?;

        let component_ref = ComponentRef {
            kit: kit.clone(),
            name: component.to_string(),
        };
        if !profile.components.contains(&component_ref) {
            debug!("component not enabled");
            return Ok(());
        }

        let name = profile.name.clone();
        installer
            .run_action(&KitAction::PreDisable {
                software_profile: name.clone(),
            })
            .await?;

        session
            .software_profile_mut(software_profile)?
            .components
            .remove(&component_ref);

        installer
            .run_action(&KitAction::Disable {
                software_profile: name.clone(),
            })
            .await?;
        installer
            .run_action(&KitAction::PostDisable {
                software_profile: name,
            })
            .await?;

        session.commit();
        info!("disabled component");

        Ok(())
    }

    /// Ask enabled components to regenerate configuration for profiles
    ///
    /// # Errors
    /// Propagates the first component failure
    pub async fn refresh(
        &self,
        session: &Session,
        software_profiles: &[String],
    ) -> Result<(), CoreError> {
        for name in software_profiles {
            session.software_profile(name)?;
        }
        Ok(self.ctx.kit_actions.refresh(session, software_profiles).await?)
    }

    fn component_installer(
        &self,
        session: &Session,
        kit: &KitSpec,
        component: &str,
    ) -> Result<Arc<dyn ComponentInstaller>, CoreError> {
        let record = session
            .kit(kit)
            .ok_or_else(|| CoreError::KitNotFound(format!("kit [{kit}] is not installed")))?;
        if !record.components.iter().any(|c| c.name == component) {
            return Err(CoreError::ComponentNotFound(format!(
                "kit [{kit}] has no component [{component}]"
            )));
        }

        self.ctx
            .kit_actions
            .registry()
            .get(kit)?
            .component(component)
            .ok_or_else(|| {
                CoreError::ComponentNotFound(format!("kit [{kit}] has no component [{component}]"))
            })
    }
}
