//! Message relay for passfill.
//!
//! Background-side logic between the popup, the credential service and the
//! page. Resolves the auth token, dispatches the lookup over the configured
//! transport with a bounded wait, and routes the normalized answer: a single
//! match is filled into the requesting tab, several matches go back to the
//! popup for the user to choose.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::managers::tab_manager::{TabManager, TabManagerTrait};
use crate::services::clipboard_fill::{self, Clipboard};
use crate::services::extension_storage::{StorageAreaTrait, StorageChange};
use crate::services::form_filler::FillReport;
use crate::services::origin::domain_of;
use crate::services::token_cache::{TokenCache, TokenCacheTrait};
use crate::services::transport::CredentialTransport;
use crate::types::credential::{CredentialEntry, FillResponse};
use crate::types::errors::{ClipboardError, RelayError};
use crate::types::message::ContentMessage;
use crate::types::tab::TabContext;

/// Default bound on how long the relay waits for the credential service.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Where a fill request ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum FillOutcome {
    /// One match, already written into the tab.
    Filled { tab_id: String, report: FillReport },
    /// Several matches; the popup must ask which one to use.
    Choose {
        tab_id: String,
        entries: Vec<CredentialEntry>,
    },
}

pub struct MessageRelay<S: StorageAreaTrait> {
    tokens: TokenCache<S>,
    transport: Box<dyn CredentialTransport>,
    tabs: Arc<Mutex<TabManager>>,
    timeout: Duration,
}

impl<S: StorageAreaTrait> MessageRelay<S> {
    pub fn new(
        storage: Arc<S>,
        transport: Box<dyn CredentialTransport>,
        tabs: Arc<Mutex<TabManager>>,
    ) -> Self {
        Self {
            tokens: TokenCache::new(storage),
            transport,
            tabs,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn tabs(&self) -> Arc<Mutex<TabManager>> {
        self.tabs.clone()
    }

    pub fn transport(&self) -> &dyn CredentialTransport {
        self.transport.as_ref()
    }

    /// Saves a new auth token. Surrounding whitespace is dropped.
    pub fn set_token(&self, token: &str) -> Result<(), RelayError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(RelayError::AuthTokenMissing);
        }
        self.tokens.set(token)?;
        info!("auth token saved");
        Ok(())
    }

    pub fn clear_token(&self) -> Result<(), RelayError> {
        self.tokens.clear()?;
        info!("auth token cleared");
        Ok(())
    }

    /// The stored token, if any.
    pub fn token(&self) -> Result<Option<String>, RelayError> {
        Ok(self.tokens.get()?)
    }

    pub fn has_token(&self) -> Result<bool, RelayError> {
        Ok(self.token()?.is_some())
    }

    /// Forwards a storage notification that did not originate from this relay.
    pub fn on_storage_change(&self, change: &StorageChange) {
        self.tokens.on_external_change(change);
    }

    /// Asks the credential service about `url` and returns its normalized answer.
    pub async fn lookup(&self, url: &str) -> Result<FillResponse, RelayError> {
        let token = if self.transport.requires_token() {
            match self.tokens.get()? {
                Some(token) => Some(token),
                None => {
                    warn!("fill requested without an auth token");
                    return Err(RelayError::AuthTokenMissing);
                }
            }
        } else {
            None
        };

        debug!(%url, transport = ?self.transport.kind(), "requesting credentials");
        match tokio::time::timeout(self.timeout, self.transport.lookup(url, token.as_deref())).await {
            Ok(result) => result,
            Err(_) => {
                warn!(%url, timeout_ms = self.timeout.as_millis() as u64, "credential service timed out");
                Err(RelayError::Timeout)
            }
        }
    }

    /// Serves a fill request from the popup for the tab in `ctx`.
    pub async fn request_fill(&self, ctx: &TabContext) -> Result<FillOutcome, RelayError> {
        match self.lookup(&ctx.url).await? {
            FillResponse::Single(entry) => {
                info!(tab = %ctx.tab_id, "single match, filling page");
                let report = self.fill_tab(&ctx.tab_id, &entry)?;
                Ok(FillOutcome::Filled {
                    tab_id: ctx.tab_id.clone(),
                    report,
                })
            }
            FillResponse::Multiple(entries) => {
                info!(tab = %ctx.tab_id, count = entries.len(), "multiple matches");
                Ok(FillOutcome::Choose {
                    tab_id: ctx.tab_id.clone(),
                    entries,
                })
            }
            FillResponse::NotFound => Err(RelayError::NotFound(domain_of(&ctx.url))),
            FillResponse::Error(message) => Err(RelayError::ServiceError(message)),
        }
    }

    /// Looks up `origin` without filling anything. With several matches the
    /// first one is returned.
    pub async fn get_credentials(&self, origin: &str) -> Result<Option<CredentialEntry>, RelayError> {
        match self.lookup(origin).await? {
            FillResponse::Single(entry) => Ok(Some(entry)),
            FillResponse::Multiple(mut entries) => Ok(if entries.is_empty() {
                None
            } else {
                Some(entries.remove(0))
            }),
            FillResponse::NotFound => Ok(None),
            FillResponse::Error(message) => Err(RelayError::ServiceError(message)),
        }
    }

    /// Sends `entry` to the content script of `tab_id`.
    pub fn fill_tab(&self, tab_id: &str, entry: &CredentialEntry) -> Result<FillReport, RelayError> {
        let message = ContentMessage::Fill {
            username: Some(entry.username.clone()),
            password: Some(entry.password.clone()),
        };
        let report = self.lock_tabs()?.send_message(tab_id, &message)?;
        if !report.any() {
            return Err(RelayError::FillTargetMissing("no login fields on the page".to_string()));
        }
        Ok(report)
    }

    /// Fills `tab_id` from `username\npassword` clipboard text.
    pub fn fill_from_clipboard(
        &self,
        tab_id: &str,
        clipboard: &mut dyn Clipboard,
    ) -> Result<FillReport, ClipboardError> {
        let mut tabs = self
            .tabs
            .lock()
            .map_err(|e| ClipboardError::Fill(e.to_string()))?;
        clipboard_fill::fill_from_clipboard(&mut *tabs, tab_id, clipboard)
    }

    fn lock_tabs(&self) -> Result<std::sync::MutexGuard<'_, TabManager>, RelayError> {
        self.tabs
            .lock()
            .map_err(|e| RelayError::FillTargetMissing(e.to_string()))
    }
}
