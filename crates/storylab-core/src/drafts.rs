//! Local draft store.
//!
//! Saved artifacts accumulate per namespace and are never rewritten or
//! removed. Storage is best-effort: failures are logged and swallowed.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::ids;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftEntry {
    pub content: String,
    #[serde(rename = "timestamp")]
    pub saved_at: DateTime<Utc>,
    pub id: u64,
}

/// Durable namespace → entries storage
pub trait KeyValueStore: Send {
    fn get(&self, namespace: &str) -> Result<Option<Vec<DraftEntry>>, StorageError>;

    fn put(&self, namespace: &str, entries: &[DraftEntry]) -> Result<(), StorageError>;
}

/// SQLite-backed store, one JSON array per namespace
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS drafts (
                namespace TEXT PRIMARY KEY,
                entries   TEXT NOT NULL
            )",
            [],
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// `<data_dir>/storylab/drafts.db`
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("storylab").join("drafts.db"))
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::Unavailable("draft database lock poisoned".to_string()))
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, namespace: &str) -> Result<Option<Vec<DraftEntry>>, StorageError> {
        let raw: Option<String> = self
            .conn()?
            .query_row(
                "SELECT entries FROM drafts WHERE namespace = ?1",
                params![namespace],
                |row| row.get(0),
            )
            .optional()?;

        raw.map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(StorageError::from)
    }

    fn put(&self, namespace: &str, entries: &[DraftEntry]) -> Result<(), StorageError> {
        let json = serde_json::to_string(entries)?;
        self.conn()?.execute(
            "INSERT INTO drafts (namespace, entries) VALUES (?1, ?2)
             ON CONFLICT(namespace) DO UPDATE SET entries = excluded.entries",
            params![namespace, json],
        )?;
        Ok(())
    }
}

/// Process-local store, mostly for tests
#[derive(Default)]
pub struct MemoryStore {
    namespaces: Mutex<HashMap<String, Vec<DraftEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, namespace: &str) -> Result<Option<Vec<DraftEntry>>, StorageError> {
        let namespaces = self.namespaces.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(namespaces.get(namespace).cloned())
    }

    fn put(&self, namespace: &str, entries: &[DraftEntry]) -> Result<(), StorageError> {
        let mut namespaces = self.namespaces.lock().unwrap_or_else(PoisonError::into_inner);
        namespaces.insert(namespace.to_string(), entries.to_vec());
        Ok(())
    }
}

pub struct DraftStore {
    store: Box<dyn KeyValueStore>,
}

impl DraftStore {
    pub fn new(store: impl KeyValueStore + 'static) -> Self {
        Self {
            store: Box::new(store),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }

    /// Append `content` under `namespace` with a fresh id and timestamp.
    ///
    /// Returns the entry even when it could not be persisted.
    pub fn save(&self, namespace: &str, content: &str) -> DraftEntry {
        let entry = DraftEntry {
            content: content.to_string(),
            saved_at: Utc::now(),
            id: ids::next_id(),
        };

        // An unreadable namespace is left alone rather than overwritten
        let mut entries = match self.store.get(namespace) {
            Ok(existing) => existing.unwrap_or_default(),
            Err(e) => {
                warn!(namespace, kind = ?e.kind(), error = %e, "failed to read drafts, entry not saved");
                return entry;
            }
        };

        entries.push(entry.clone());
        match self.store.put(namespace, &entries) {
            Ok(()) => debug!(namespace, id = entry.id, count = entries.len(), "draft saved"),
            Err(e) => warn!(namespace, kind = ?e.kind(), error = %e, "failed to save draft"),
        }
        entry
    }

    /// Every entry saved under `namespace`, oldest first
    pub fn load_all(&self, namespace: &str) -> Vec<DraftEntry> {
        match self.store.get(namespace) {
            Ok(entries) => entries.unwrap_or_default(),
            Err(e) => {
                warn!(namespace, kind = ?e.kind(), error = %e, "failed to load drafts");
                Vec::new()
            }
        }
    }
}
