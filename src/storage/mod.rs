//! # Persistence Layer
//!
//! A flat key-value store holding JSON text, plus the two logs built on it:
//!
//! | Key | Contents |
//! |-----|----------|
//! | `qr-code-generator-history` | [`GeneratedCode`] array, newest first, at most 50 |
//! | `qr-code-templates` | [`Template`] array, in save order |
//!
//! Reads never fail: a missing key or unparsable JSON reads as an empty list
//! (corruption is logged). Writes report [`QrForgeError::Storage`].

mod history;
mod templates;

pub use history::{GeneratedCode, HISTORY_KEY, HistoryLog, MAX_HISTORY, NewCode};
pub use templates::{TEMPLATES_KEY, Template, TemplateStore};

use serde::{Serialize, de::DeserializeOwned};
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{QrForgeError, Result};

/// String key-value storage, the local-storage capability.
pub trait KeyValueStore: Send {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn clear(&mut self) -> Result<()>;
}

/// In-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}

/// One `<key>.json` file per key in a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.dir.join(format!("{}.json", name))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(value) => Some(value),
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read store file");
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&tmp, value))
            .and_then(|_| fs::rename(&tmp, &path))
            .map_err(|e| QrForgeError::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(QrForgeError::Storage(format!(
                "Failed to remove {}: {}",
                path.display(),
                e
            ))),
        }
    }

    fn clear(&mut self) -> Result<()> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(QrForgeError::Storage(e.to_string())),
        };
        for entry in entries {
            let path = entry.map_err(|e| QrForgeError::Storage(e.to_string()))?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                fs::remove_file(&path).map_err(|e| QrForgeError::Storage(e.to_string()))?;
            }
        }
        Ok(())
    }
}

/// Read a JSON array under `key`; absent or corrupt reads as empty.
pub(crate) fn read_list<T: DeserializeOwned>(store: &dyn KeyValueStore, key: &str) -> Vec<T> {
    let Some(raw) = store.get(key) else {
        return Vec::new();
    };
    match serde_json::from_str(&raw) {
        Ok(list) => list,
        Err(e) => {
            warn!(key, error = %e, "stored list is corrupt, treating as empty");
            Vec::new()
        }
    }
}

pub(crate) fn write_list<T: Serialize>(store: &mut dyn KeyValueStore, key: &str, list: &[T]) -> Result<()> {
    let json = serde_json::to_string(list)
        .map_err(|e| QrForgeError::Storage(format!("Failed to serialize {}: {}", key, e)))?;
    store.set(key, &json)
}

/// Milliseconds since the Unix epoch.
pub(crate) fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert_eq!(store.get("a"), None);
        store.set("a", "1").unwrap();
        assert_eq!(store.get("a").as_deref(), Some("1"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a"), None);
    }

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = FileStore::new(dir.path().join("data"));
        assert_eq!(store.get(HISTORY_KEY), None);

        store.set(HISTORY_KEY, "[]").unwrap();
        assert!(dir.path().join("data/qr-code-generator-history.json").exists());
        assert_eq!(store.get(HISTORY_KEY).as_deref(), Some("[]"));

        store.set(TEMPLATES_KEY, "[]").unwrap();
        store.remove(HISTORY_KEY).unwrap();
        store.remove(HISTORY_KEY).unwrap();
        assert_eq!(store.get(HISTORY_KEY), None);

        store.clear().unwrap();
        assert_eq!(store.get(TEMPLATES_KEY), None);
    }

    #[test]
    fn test_read_list_tolerates_corruption() {
        let mut store = MemoryStore::new();
        store.set("k", "{not json").unwrap();
        let list: Vec<u32> = read_list(&store, "k");
        assert!(list.is_empty());
    }
}
