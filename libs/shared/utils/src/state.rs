use std::sync::Arc;

use shared_config::AppConfig;
use shared_database::Store;

use crate::clock::Clock;

/// Shared handler state: configuration plus the injected store and clock.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
}

impl AppState {
    pub fn new(config: AppConfig, store: Arc<dyn Store>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config: Arc::new(config),
            store,
            clock,
        }
    }
}
