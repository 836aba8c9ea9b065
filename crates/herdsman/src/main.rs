//! herdsman daemon
//!
//! Loads the cluster configuration, seeds the store and runs the cluster
//! update worker until interrupted.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use herdsman_core::{Cluster, CoreContext, ScriptBootHostManager, SyncManager};
use herdsman_db::Database;
use herdsman_exec::{CommandExecutor, LocalExecutor};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod factory;
mod seed;

use config::Config;

#[derive(Parser, Debug)]
#[command(name = "herdsman")]
#[command(about = "Cluster node provisioning daemon", long_about = None)]
#[command(version)]
struct Args {
    /// Configuration file (defaults to `HERDSMAN_CONFIG` or the standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

fn init_tracing(config: &Config, json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.daemon.log_level));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };
    init_tracing(&config, args.json_logs || config.daemon.json_logs);

    info!(version = env!("CARGO_PKG_VERSION"), "herdsman starting");

    let core_config = Arc::new(config.core.clone());
    let executor: Arc<dyn CommandExecutor> = Arc::new(
        LocalExecutor::new()
            .with_env("HERDSMAN_INSTALLER", core_config.installer_hostname.clone())
            .with_default_timeout(Duration::from_secs(300)),
    );

    let (sync, sync_handle) = SyncManager::spawn(
        executor.clone(),
        core_config.cluster_update_command.clone(),
        Duration::from_secs(core_config.cluster_update_delay_secs),
    );

    let adapters = Arc::new(factory::adapter_registry(executor.clone(), &core_config));
    let kits = Arc::new(factory::kit_registry(executor.clone(), &config.base_kit));
    let boot = Arc::new(ScriptBootHostManager::new(executor, &core_config));

    let ctx = CoreContext::new(core_config, adapters, kits, boot, Arc::new(sync));
    let cluster = Cluster::new(Database::new(), ctx);

    seed::seed(&cluster, &config).await?;
    info!(
        networks = config.network.len(),
        hardware_profiles = config.hardware_profile.len(),
        software_profiles = config.software_profile.len(),
        "cluster configuration seeded"
    );

    let mut events = cluster.subscribe();
    let event_log = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => match serde_json::to_string(&event) {
                    Ok(json) => info!(event = %json, "cluster event"),
                    Err(e) => warn!(error = %e, "unable to encode cluster event"),
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event log lagged"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    drop(cluster);
    event_log.abort();
    if let Err(e) = sync_handle.await {
        debug!(error = %e, "cluster update worker ended abnormally");
    }

    Ok(())
}
