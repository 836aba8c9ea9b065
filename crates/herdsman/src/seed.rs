//! Startup seeding of networks, profiles and the base kit

use herdsman_core::{Cluster, CoreError};
use herdsman_db::{HardwareProfile, KitSpec, Session, SoftwareProfile};
use herdsman_kit::BASE_KIT;
use tracing::{debug, info};

use crate::config::{Config, HardwareProfileSeed, SoftwareProfileSeed};

/// Create everything the configuration declares that does not exist yet
///
/// # Errors
/// Returns error if a declared profile references an unknown network, or
/// installing the base kit or enabling a component fails
pub async fn seed(cluster: &Cluster, config: &Config) -> eyre::Result<()> {
    let mut session = cluster.database().session().await;

    for network in &config.network {
        if session.network_by_key(&network.key()).is_some() {
            continue;
        }
        cluster.networks().add_network(&mut session, network.clone())?;
    }

    for seed in &config.hardware_profile {
        if session.hardware_profile(&seed.name).is_ok() {
            continue;
        }
        let profile = hardware_profile(&session, seed)?;
        session.insert_hardware_profile(profile)?;
        info!(hardware_profile = %seed.name, "created hardware profile");
    }

    for seed in &config.software_profile {
        if session.software_profile(&seed.name).is_ok() {
            continue;
        }
        session.insert_software_profile(software_profile(seed))?;
        info!(software_profile = %seed.name, "created software profile");
    }
    session.commit();

    let Some(base) = cluster
        .context()
        .kit_actions
        .registry()
        .all()
        .into_iter()
        .find(|kit| kit.spec().name == BASE_KIT)
    else {
        return Ok(());
    };
    let spec: KitSpec = base.spec().clone();

    if session.kit(&spec).is_none() {
        cluster.kits().install_kit(&mut session, &spec).await?;
    }

    for seed in &config.software_profile {
        for component in &seed.components {
            cluster
                .software_profiles()
                .enable_component(&mut session, &seed.name, &spec, component)
                .await?;
            debug!(software_profile = %seed.name, component = %component, "component enabled");
        }
    }

    Ok(())
}

fn hardware_profile(
    session: &Session,
    seed: &HardwareProfileSeed,
) -> Result<HardwareProfile, CoreError> {
    let mut profile = HardwareProfile::new(seed.name.clone(), seed.name_format.clone())
        .with_location(seed.location);
    profile.description.clone_from(&seed.description);
    profile.resource_adapter.clone_from(&seed.resource_adapter);

    for key in &seed.networks {
        let network = session
            .network_by_key(key)
            .ok_or_else(|| CoreError::NetworkNotFound(key.clone()))?;
        profile.networks.insert(network.id);
    }

    Ok(profile)
}

fn software_profile(seed: &SoftwareProfileSeed) -> SoftwareProfile {
    let mut profile = SoftwareProfile::new(seed.name.clone())
        .with_kind(seed.kind)
        .with_locked_state(seed.locked_state)
        .with_min_nodes(seed.min_nodes);
    profile.description.clone_from(&seed.description);
    profile.is_idle = seed.idle;
    profile
}
