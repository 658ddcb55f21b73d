//! Named option presets.

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::{KeyValueStore, now_millis, read_list, write_list};
use crate::error::{QrForgeError, Result};
use crate::options::{CodeKind, OptionsPatch};

pub const TEMPLATES_KEY: &str = "qr-code-templates";

/// A saved set of partial options. Names need not be unique.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: CodeKind,
    pub options: OptionsPatch,
    pub timestamp: i64,
    #[serde(default)]
    pub sequence: u64,
}

pub struct TemplateStore<'a> {
    store: &'a mut dyn KeyValueStore,
}

impl<'a> TemplateStore<'a> {
    pub fn new(store: &'a mut dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// Templates in save order.
    pub fn get(&self) -> Vec<Template> {
        read_list::<Template>(&*self.store, TEMPLATES_KEY)
            .into_iter()
            .map(|mut t| {
                t.options = t.options.normalized(t.kind);
                t
            })
            .collect()
    }

    pub fn save(&mut self, name: &str, kind: CodeKind, options: OptionsPatch) -> Result<Template> {
        if name.trim().is_empty() {
            return Err(QrForgeError::Validation("Please enter a template name".into()));
        }
        options.check_kind(kind)?;

        let mut templates = self.get();
        let sequence = templates.iter().map(|t| t.sequence).max().unwrap_or(0) + 1;
        let template = Template {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            kind,
            options: options.normalized(kind),
            timestamp: now_millis(),
            sequence,
        };

        templates.push(template.clone());
        write_list(self.store, TEMPLATES_KEY, &templates)?;
        info!(id = %template.id, name = %template.name, "template saved");
        Ok(template)
    }

    pub fn find(&self, id: &str) -> Result<Template> {
        self.get()
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| QrForgeError::NotFound(format!("template {}", id)))
    }

    pub fn remove(&mut self, id: &str) -> Result<()> {
        let mut templates = self.get();
        let before = templates.len();
        templates.retain(|t| t.id != id);
        if templates.len() == before {
            return Err(QrForgeError::NotFound(format!("template {}", id)));
        }
        write_list(self.store, TEMPLATES_KEY, &templates)
    }
}
