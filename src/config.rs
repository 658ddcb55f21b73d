//! Server and storage configuration.
//!
//! Values come from CLI flags with environment fallbacks
//! (`QRFORGE_LISTEN`, `QRFORGE_DATA_DIR`, `QRFORGE_BASE_PATH`).

use std::path::PathBuf;

use crate::storage::FileStore;

pub const DEFAULT_LISTEN: &str = "127.0.0.1:8080";
pub const DEFAULT_DATA_DIR: &str = "qrforge-data";

/// Where history and templates live.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl StorageConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn open(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Mount point, `""` or `/segment…` without a trailing slash
    pub base_path: String,
    pub storage: StorageConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: DEFAULT_LISTEN.to_string(),
            base_path: String::new(),
            storage: StorageConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(listen_addr: impl Into<String>, storage: StorageConfig) -> Self {
        Self {
            listen_addr: listen_addr.into(),
            base_path: String::new(),
            storage,
        }
    }

    /// Set the mount point; see [`normalize_base_path`].
    pub fn base_path(mut self, raw: &str) -> Self {
        self.base_path = normalize_base_path(raw);
        self
    }
}

/// `""`, `"/"` → `""`; `"app/"`, `"//app//x/"` → `"/app"`, `"/app/x"`.
pub fn normalize_base_path(raw: &str) -> String {
    raw.split('/')
        .filter(|segment| !segment.trim().is_empty())
        .map(|segment| format!("/{}", segment.trim()))
        .collect()
}
