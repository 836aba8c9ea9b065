//! Resource adapter and kit registration

use std::sync::Arc;

use herdsman_adapter::{AdapterRegistry, DEFAULT_ADAPTER, DefaultAdapter, ResourceAdapter};
use herdsman_core::CoreConfig;
use herdsman_exec::CommandExecutor;
use herdsman_kit::{BaseKit, BaseKitConfig, KitRegistry};
use uuid::Uuid;

/// Registry holding the built-in `default` adapter
pub fn adapter_registry(executor: Arc<dyn CommandExecutor>, config: &CoreConfig) -> AdapterRegistry {
    let hook_script = config.hook_script.clone();
    let dns_zone = config.dns_zone.clone();

    let factory = move |session: Option<Uuid>| -> Arc<dyn ResourceAdapter> {
        Arc::new(
            DefaultAdapter::new(executor.clone())
                .with_hook_script(hook_script.clone())
                .with_dns_zone(dns_zone.clone())
                .with_add_host_session(session),
        )
    };

    let registry = AdapterRegistry::new();
    registry.register(DEFAULT_ADAPTER, Arc::new(factory));
    registry
}

/// Registry holding the built-in `base` kit
pub fn kit_registry(executor: Arc<dyn CommandExecutor>, config: &BaseKitConfig) -> KitRegistry {
    let registry = KitRegistry::new();
    registry.register(Arc::new(BaseKit::new(executor, config)));
    registry
}
