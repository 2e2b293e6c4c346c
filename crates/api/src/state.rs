use std::sync::Arc;

use sitebuilder_core::events::EventBus;
use sitebuilder_core::site::DomainConfig;

use crate::config::AppConfig;
use crate::store::Store;

/// Shared application state, passed to all handlers via Axum's `State` extractor.
/// Wrapped in `Arc` so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    store: Store,
    config: AppConfig,
    domains: DomainConfig,
    event_bus: EventBus,
}

impl AppState {
    pub fn new(store: Store, config: AppConfig, event_bus: EventBus) -> Self {
        let domains = config.domain_config();
        Self {
            inner: Arc::new(InnerState {
                store,
                config,
                domains,
                event_bus,
            }),
        }
    }

    pub fn store(&self) -> &Store {
        &self.inner.store
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn domains(&self) -> &DomainConfig {
        &self.inner.domains
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.inner.event_bus
    }
}
