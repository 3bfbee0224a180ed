//! Auth token cache for passfill.
//!
//! Read-through cache over the `authToken` key of extension storage. The
//! token is loaded lazily on first use and invalidated whenever storage
//! reports a write to that key.

use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, info};

use crate::services::extension_storage::{StorageAreaTrait, StorageChange};
use crate::types::errors::StorageError;

/// Storage key the token is persisted under.
pub const AUTH_TOKEN_KEY: &str = "authToken";

#[derive(Debug, Clone, PartialEq)]
enum CacheState {
    Unloaded,
    Loaded(Option<String>),
}

struct Inner {
    state: CacheState,
    changes: broadcast::Receiver<StorageChange>,
}

/// Trait defining token cache operations.
pub trait TokenCacheTrait {
    fn get(&self) -> Result<Option<String>, StorageError>;
    fn set(&self, token: &str) -> Result<(), StorageError>;
    fn clear(&self) -> Result<(), StorageError>;
    fn on_external_change(&self, change: &StorageChange);
}

pub struct TokenCache<S: StorageAreaTrait> {
    storage: Arc<S>,
    inner: Mutex<Inner>,
}

impl<S: StorageAreaTrait> TokenCache<S> {
    pub fn new(storage: Arc<S>) -> Self {
        let changes = storage.subscribe();
        Self {
            storage,
            inner: Mutex::new(Inner {
                state: CacheState::Unloaded,
                changes,
            }),
        }
    }

    /// Whether the token has been read from storage yet.
    pub fn is_loaded(&self) -> bool {
        self.lock()
            .map(|inner| inner.state != CacheState::Unloaded)
            .unwrap_or(false)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StorageError> {
        self.inner
            .lock()
            .map_err(|e| StorageError::DatabaseError(format!("token cache poisoned: {}", e)))
    }

    fn apply(inner: &mut Inner, change: &StorageChange) {
        if change.key != AUTH_TOKEN_KEY {
            return;
        }
        let token = change
            .new_value
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string);
        debug!(present = token.is_some(), "auth token changed in storage");
        inner.state = CacheState::Loaded(token);
    }

    /// Applies notifications that arrived since the last call.
    fn drain_changes(inner: &mut Inner) {
        loop {
            match inner.changes.try_recv() {
                Ok(change) => Self::apply(inner, &change),
                Err(TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "missed storage notifications, invalidating token");
                    inner.state = CacheState::Unloaded;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }
}

impl<S: StorageAreaTrait> TokenCacheTrait for TokenCache<S> {
    fn get(&self) -> Result<Option<String>, StorageError> {
        let mut inner = self.lock()?;
        Self::drain_changes(&mut inner);

        if let CacheState::Loaded(token) = &inner.state {
            return Ok(token.clone());
        }

        let token = self
            .storage
            .get(AUTH_TOKEN_KEY)?
            .as_ref()
            .and_then(Value::as_str)
            .map(str::to_string);
        if token.is_some() {
            info!("auth token loaded from storage");
        } else {
            info!("no auth token stored, user needs to provide one");
        }
        inner.state = CacheState::Loaded(token.clone());
        Ok(token)
    }

    fn set(&self, token: &str) -> Result<(), StorageError> {
        self.storage
            .set(AUTH_TOKEN_KEY, Value::String(token.to_string()))?;
        let mut inner = self.lock()?;
        Self::drain_changes(&mut inner);
        inner.state = CacheState::Loaded(Some(token.to_string()));
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.storage.remove(AUTH_TOKEN_KEY)?;
        let mut inner = self.lock()?;
        Self::drain_changes(&mut inner);
        inner.state = CacheState::Loaded(None);
        Ok(())
    }

    fn on_external_change(&self, change: &StorageChange) {
        if let Ok(mut inner) = self.lock() {
            Self::apply(&mut inner, change);
        }
    }
}
