use std::sync::Arc;

use crate::config::AppConfig;
use crate::dispatcher::Dispatcher;
use crate::health::HealthRegistry;
use crate::inventory::InventoryStore;

/// Gateway application state (shared).
///
/// `inventory` and `registry` are the same `Arc`s the `Dispatcher` was
/// built with — handlers that bypass the dispatcher (product CRUD,
/// control endpoints, stats) share them directly instead of reaching
/// through `dispatcher.inventory`.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<Dispatcher>,
    pub inventory: Arc<InventoryStore>,
    pub registry: Arc<HealthRegistry>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        dispatcher: Arc<Dispatcher>,
        inventory: Arc<InventoryStore>,
        registry: Arc<HealthRegistry>,
        config: Arc<AppConfig>,
    ) -> Self {
        Self {
            dispatcher,
            inventory,
            registry,
            config,
        }
    }
}
