//! Bounded log of generated codes.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use super::{KeyValueStore, now_millis, read_list, write_list};
use crate::error::{QrForgeError, Result};
use crate::options::{CodeKind, OptionsPatch};
use crate::payload::QrType;

pub const HISTORY_KEY: &str = "qr-code-generator-history";

/// Oldest entries beyond this are dropped on append.
pub const MAX_HISTORY: usize = 50;

/// Characters of `data` shown by [`GeneratedCode::preview`].
const PREVIEW_CHARS: usize = 30;

/// A successfully generated code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedCode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qr_type: Option<QrType>,
    /// Encoded payload string
    pub data: String,
    /// Rendered image as a data URL
    pub image: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<OptionsPatch>,
    #[serde(default)]
    pub sequence: u64,
}

impl GeneratedCode {
    /// `data` cut to 30 characters, with "..." when cut.
    pub fn preview(&self) -> String {
        if self.data.chars().count() > PREVIEW_CHARS {
            let head: String = self.data.chars().take(PREVIEW_CHARS).collect();
            format!("{}...", head)
        } else {
            self.data.clone()
        }
    }
}

/// Everything about a new entry except what the log assigns.
#[derive(Debug, Clone, PartialEq)]
pub struct NewCode {
    pub kind: CodeKind,
    pub qr_type: Option<QrType>,
    pub data: String,
    pub image: String,
    pub options: Option<OptionsPatch>,
}

impl NewCode {
    pub fn new(kind: CodeKind, data: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            kind,
            qr_type: None,
            data: data.into(),
            image: image.into(),
            options: None,
        }
    }

    pub fn qr_type(mut self, qr_type: QrType) -> Self {
        self.qr_type = Some(qr_type);
        self
    }

    pub fn options(mut self, options: OptionsPatch) -> Self {
        self.options = Some(options);
        self
    }
}

/// History view over a store.
pub struct HistoryLog<'a> {
    store: &'a mut dyn KeyValueStore,
}

impl<'a> HistoryLog<'a> {
    pub fn new(store: &'a mut dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Entries, newest first.
    pub fn get(&self) -> Vec<GeneratedCode> {
        read_list::<GeneratedCode>(&*self.store, HISTORY_KEY)
            .into_iter()
            .map(|mut entry| {
                entry.options = entry.options.map(|o| o.normalized(entry.kind));
                entry
            })
            .collect()
    }

    /// Store `code` at the head, assigning id, timestamp and sequence, and
    /// evict past [`MAX_HISTORY`].
    pub fn append(&mut self, code: NewCode) -> Result<GeneratedCode> {
        let mut history = self.get();
        let sequence = history.iter().map(|e| e.sequence).max().unwrap_or(0) + 1;

        let entry = GeneratedCode {
            id: Uuid::new_v4().to_string(),
            kind: code.kind,
            qr_type: code.qr_type,
            data: code.data,
            image: code.image,
            timestamp: now_millis(),
            options: code.options.map(|o| o.normalized(code.kind)),
            sequence,
        };

        history.insert(0, entry.clone());
        if history.len() > MAX_HISTORY {
            debug!(evicted = history.len() - MAX_HISTORY, "history full");
            history.truncate(MAX_HISTORY);
        }
        write_list(self.store, HISTORY_KEY, &history)?;
        info!(id = %entry.id, kind = entry.kind.as_str(), "added to history");
        Ok(entry)
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        let mut history = self.get();
        let before = history.len();
        history.retain(|e| e.id != id);
        if history.len() == before {
            return Err(QrForgeError::NotFound(format!("history entry {}", id)));
        }
        write_list(self.store, HISTORY_KEY, &history)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(HISTORY_KEY)
    }
}
