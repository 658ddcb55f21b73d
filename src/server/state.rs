//! Server state shared across handlers.

use tokio::sync::Mutex;

use crate::config::ServerConfig;
use crate::storage::KeyValueStore;

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    /// Unix timestamp of server boot for cache busting.
    pub boot_time: i64,
    /// History and templates. Held across each read-modify-write.
    pub store: Mutex<Box<dyn KeyValueStore>>,
}

impl AppState {
    /// State backed by the configured data directory.
    pub fn new(config: ServerConfig) -> Self {
        let store = config.storage.open();
        Self::with_store(config, store)
    }

    pub fn with_store(config: ServerConfig, store: impl KeyValueStore + 'static) -> Self {
        Self {
            config,
            boot_time: chrono::Utc::now().timestamp(),
            store: Mutex::new(Box::new(store)),
        }
    }
}
