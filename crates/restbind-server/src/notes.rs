//! In-memory note model
//!
//! `Note` is the demo resource mounted by the server. Each note carries a
//! handle to the [`NoteStore`] it belongs to, so `save` and `destroy` work
//! the way an active-record model would.

use async_trait::async_trait;
use restbind::{Mapping, Persistable, Serializable, Settable};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::debug;

/// Errors raised by the note model
#[derive(Error, Debug, PartialEq)]
pub enum NoteError {
    /// Attribute does not exist on a note
    #[error("Unknown attribute: {0}")]
    UnknownAttribute(String),

    /// Attribute exists but the value has the wrong shape
    #[error("Invalid value for '{field}': expected {expected}")]
    InvalidValue {
        field: String,
        expected: &'static str,
    },
}

/// Shared note storage
#[derive(Debug, Clone, Default)]
pub struct NoteStore {
    notes: Arc<RwLock<HashMap<String, Note>>>,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unsaved note bound to this store
    pub fn build(&self) -> Note {
        Note {
            store: Some(self.clone()),
            ..Note::default()
        }
    }

    /// Look up a note by id
    pub async fn find(&self, id: &str) -> Option<Note> {
        self.notes.read().await.get(id).cloned()
    }

    pub async fn len(&self) -> usize {
        self.notes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.notes.read().await.is_empty()
    }

    async fn upsert(&self, note: Note) {
        self.notes.write().await.insert(note.id.clone(), note);
    }

    async fn remove(&self, id: &str) -> bool {
        self.notes.write().await.remove(id).is_some()
    }
}

/// A note
#[derive(Debug, Clone, Default, Serialize)]
pub struct Note {
    pub id: String,
    pub title: String,
    pub body: String,
    pub tags: Vec<String>,
    #[serde(skip)]
    store: Option<NoteStore>,
}

impl Note {
    fn store(&self) -> anyhow::Result<&NoteStore> {
        self.store
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("Note '{}' is not attached to a store", self.id))
    }
}

fn string_value(field: &str, value: Value) -> Result<String, NoteError> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(NoteError::InvalidValue {
            field: field.to_string(),
            expected: "a string",
        }),
    }
}

fn tags_value(value: Value) -> Result<Vec<String>, NoteError> {
    let invalid = || NoteError::InvalidValue {
        field: "tags".to_string(),
        expected: "a list of strings or a comma-separated string",
    };
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::String(tag) => Ok(tag),
                _ => Err(invalid()),
            })
            .collect(),
        Value::String(list) => Ok(list
            .split(',')
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .map(str::to_string)
            .collect()),
        _ => Err(invalid()),
    }
}

impl Settable for Note {
    fn set(&mut self, name: &str, value: Value) -> anyhow::Result<()> {
        match name {
            "id" => self.id = string_value(name, value)?,
            "title" => self.title = string_value(name, value)?,
            "body" => self.body = string_value(name, value)?,
            "tags" => self.tags = tags_value(value)?,
            _ => return Err(NoteError::UnknownAttribute(name.to_string()).into()),
        }
        Ok(())
    }
}

#[async_trait]
impl Persistable for Note {
    async fn save(&mut self) -> anyhow::Result<()> {
        if self.id.is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
        let store = self.store()?.clone();
        store.upsert(self.clone()).await;
        debug!("Saved note {}", self.id);
        Ok(())
    }

    async fn destroy(&mut self) -> anyhow::Result<()> {
        let store = self.store()?.clone();
        if !store.remove(&self.id).await {
            anyhow::bail!("Note '{}' was already removed", self.id);
        }
        debug!("Destroyed note {}", self.id);
        Ok(())
    }
}

impl Serializable for Note {
    /// Notes render natively as `{"note": {...}}`.
    fn to_json(&self) -> Option<anyhow::Result<String>> {
        Some(
            serde_json::to_string(&json!({ "note": self }))
                .map_err(anyhow::Error::from),
        )
    }

    fn to_mapping(&self) -> Option<Mapping> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => Some(map),
            _ => None,
        }
    }
}
