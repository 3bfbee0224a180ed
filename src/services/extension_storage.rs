//! Extension storage for passfill.
//!
//! A persisted key/value area (the equivalent of `storage.local`) backed by
//! the SQLite database. Every write is broadcast as a [`StorageChange`] so
//! other components can keep caches in sync.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rusqlite::{params, OptionalExtension};
use serde_json::Value;
use tokio::sync::broadcast;
use tracing::debug;

use crate::database::connection::Database;
use crate::types::errors::StorageError;

/// Name of the only area the client uses.
pub const LOCAL_AREA: &str = "local";

const CHANGE_CHANNEL_CAPACITY: usize = 32;

/// Notification emitted after a key is written or removed.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageChange {
    pub area: String,
    pub key: String,
    pub old_value: Option<Value>,
    pub new_value: Option<Value>,
}

/// Trait defining storage area operations.
pub trait StorageAreaTrait {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError>;
    fn set(&self, key: &str, value: Value) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
    fn subscribe(&self) -> broadcast::Receiver<StorageChange>;
}

/// SQLite-backed storage area.
pub struct ExtensionStorage {
    db: Mutex<Database>,
    area: String,
    changes: broadcast::Sender<StorageChange>,
}

impl ExtensionStorage {
    pub fn new(db: Database) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Self {
            db: Mutex::new(db),
            area: LOCAL_AREA.to_string(),
            changes,
        }
    }

    pub fn area(&self) -> &str {
        &self.area
    }

    fn with_db<T>(&self, f: impl FnOnce(&Database) -> Result<T, StorageError>) -> Result<T, StorageError> {
        let db = self
            .db
            .lock()
            .map_err(|e| StorageError::DatabaseError(e.to_string()))?;
        f(&*db)
    }

    fn read(db: &Database, area: &str, key: &str) -> Result<Option<Value>, StorageError> {
        let raw: Option<String> = db
            .connection()
            .query_row(
                "SELECT value FROM extension_storage WHERE area = ?1 AND key = ?2",
                params![area, key],
                |row| row.get(0),
            )
            .optional()?;
        raw.map(|s| serde_json::from_str(&s))
            .transpose()
            .map_err(|e| StorageError::SerializationError(e.to_string()))
    }

    fn notify(&self, key: &str, old_value: Option<Value>, new_value: Option<Value>) {
        debug!(area = %self.area, key, "storage changed");
        // No subscribers is fine.
        let _ = self.changes.send(StorageChange {
            area: self.area.clone(),
            key: key.to_string(),
            old_value,
            new_value,
        });
    }

    fn now_ts() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }
}

impl StorageAreaTrait for ExtensionStorage {
    fn get(&self, key: &str) -> Result<Option<Value>, StorageError> {
        self.with_db(|db| Self::read(db, &self.area, key))
    }

    fn set(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let encoded = serde_json::to_string(&value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;
        let old_value = self.with_db(|db| {
            let old = Self::read(db, &self.area, key)?;
            db.connection().execute(
                "INSERT OR REPLACE INTO extension_storage (area, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![self.area, key, encoded, Self::now_ts()],
            )?;
            Ok(old)
        })?;
        self.notify(key, old_value, Some(value));
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let old_value = self.with_db(|db| {
            let old = Self::read(db, &self.area, key)?;
            db.connection().execute(
                "DELETE FROM extension_storage WHERE area = ?1 AND key = ?2",
                params![self.area, key],
            )?;
            Ok(old)
        })?;
        if old_value.is_some() {
            self.notify(key, old_value, None);
        }
        Ok(())
    }

    fn subscribe(&self) -> broadcast::Receiver<StorageChange> {
        self.changes.subscribe()
    }
}
