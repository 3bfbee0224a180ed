//! Popup controller for passfill.
//!
//! Models the toolbar popup as a state machine. The idle popup offers
//! "Fill" and "Settings"; Error, Selection and Settings are mutually
//! exclusive modals on top of it. A fill with a single match fills the page
//! and closes the popup.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::managers::tab_manager::TabManagerTrait;
use crate::services::extension_storage::StorageAreaTrait;
use crate::services::message_relay::{FillOutcome, MessageRelay};
use crate::types::credential::CredentialEntry;
use crate::types::errors::{PopupError, RelayError};
use crate::types::settings::PopupSettings;
use crate::types::tab::TabContext;

/// Height of a modal's title bar and buttons.
const MODAL_FRAME_HEIGHT: u32 = 72;
/// Height of one row in the selection list.
const ENTRY_ROW_HEIGHT: u32 = 52;
/// Height of the settings form.
const SETTINGS_FORM_HEIGHT: u32 = 170;

#[derive(Debug, Clone, PartialEq)]
pub enum PopupState {
    Idle,
    /// Waiting for the relay to answer a fill request.
    Busy,
    Error {
        title: String,
        message: String,
    },
    Selection {
        tab_id: String,
        entries: Vec<CredentialEntry>,
    },
    Settings {
        token_input: String,
        error: Option<String>,
    },
    Closed,
}

impl PopupState {
    pub fn name(&self) -> &'static str {
        match self {
            PopupState::Idle => "idle",
            PopupState::Busy => "busy",
            PopupState::Error { .. } => "error",
            PopupState::Selection { .. } => "selection",
            PopupState::Settings { .. } => "settings",
            PopupState::Closed => "closed",
        }
    }
}

/// One row of the selection list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectionItem {
    pub label: String,
    pub detail: String,
}

impl From<&CredentialEntry> for SelectionItem {
    fn from(entry: &CredentialEntry) -> Self {
        let detail = if entry.username.is_empty() {
            "No username".to_string()
        } else {
            entry.username.clone()
        };
        Self {
            label: entry.label().to_string(),
            detail,
        }
    }
}

/// Clamps a desired popup height into the configured range.
pub fn clamp_height(settings: &PopupSettings, desired: u32) -> u32 {
    desired.clamp(settings.min_height, settings.max_height.max(settings.min_height))
}

/// Title and message shown for a failed fill.
pub fn error_view(err: &RelayError) -> (String, String) {
    match err {
        RelayError::NotFound(domain) => (
            "No Credentials".to_string(),
            format!("No credentials found for {}", domain),
        ),
        RelayError::FillTargetMissing(_) => (
            "Fill Failed".to_string(),
            "Could not fill the login form".to_string(),
        ),
        other => ("Error".to_string(), other.to_string()),
    }
}

pub struct PopupController<S: StorageAreaTrait> {
    relay: Arc<MessageRelay<S>>,
    settings: PopupSettings,
    state: PopupState,
}

impl<S: StorageAreaTrait> PopupController<S> {
    pub fn new(relay: Arc<MessageRelay<S>>, settings: PopupSettings) -> Self {
        Self {
            relay,
            settings,
            state: PopupState::Idle,
        }
    }

    pub fn state(&self) -> &PopupState {
        &self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == PopupState::Closed
    }

    /// Current popup height. Modals grow the popup to fit their content.
    pub fn height(&self) -> u32 {
        let content = match &self.state {
            PopupState::Selection { entries, .. } => {
                MODAL_FRAME_HEIGHT + ENTRY_ROW_HEIGHT * entries.len() as u32
            }
            PopupState::Settings { .. } => MODAL_FRAME_HEIGHT + SETTINGS_FORM_HEIGHT,
            _ => return self.settings.min_height,
        };
        clamp_height(&self.settings, content + self.settings.chrome_padding)
    }

    /// Rows of the selection list, in the order the service returned them.
    pub fn selection_items(&self) -> Vec<SelectionItem> {
        match &self.state {
            PopupState::Selection { entries, .. } => entries.iter().map(SelectionItem::from).collect(),
            _ => Vec::new(),
        }
    }

    /// "Fill" for the browser's active tab.
    pub async fn click_fill(&mut self) -> Result<(), PopupError> {
        self.expect_idle("fill")?;
        let ctx = match self.relay.tabs().lock() {
            Ok(tabs) => tabs.active_context().map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        match ctx {
            Ok(ctx) => self.run_fill(&ctx).await,
            Err(message) => {
                self.show_error("Error", &message);
                Ok(())
            }
        }
    }

    /// "Fill" for an explicit tab.
    pub async fn fill_for(&mut self, ctx: &TabContext) -> Result<(), PopupError> {
        self.expect_idle("fill")?;
        self.run_fill(ctx).await
    }

    async fn run_fill(&mut self, ctx: &TabContext) -> Result<(), PopupError> {
        self.state = PopupState::Busy;
        match self.relay.request_fill(ctx).await {
            Ok(FillOutcome::Filled { .. }) => {
                info!(tab = %ctx.tab_id, "filled single match, closing popup");
                self.state = PopupState::Closed;
            }
            Ok(FillOutcome::Choose { tab_id, entries }) => {
                self.state = PopupState::Selection { tab_id, entries };
            }
            Err(e) => {
                warn!(error = %e, "fill request failed");
                let (title, message) = error_view(&e);
                self.show_error(&title, &message);
            }
        }
        Ok(())
    }

    /// Fills the entry at `index` of the selection list and closes.
    pub fn select_entry(&mut self, index: usize) -> Result<(), PopupError> {
        let (tab_id, entry) = match &self.state {
            PopupState::Selection { tab_id, entries } => {
                let entry = entries.get(index).ok_or(PopupError::NoSuchEntry(index))?;
                (tab_id.clone(), entry.clone())
            }
            other => {
                return Err(PopupError::InvalidState {
                    action: "select an entry",
                    state: other.name(),
                })
            }
        };

        debug!(index, tab = %tab_id, "entry selected");
        match self.relay.fill_tab(&tab_id, &entry) {
            Ok(_) => self.state = PopupState::Closed,
            Err(e) => {
                warn!(error = %e, "filling selected entry failed");
                let (title, message) = error_view(&e);
                self.show_error(&title, &message);
            }
        }
        Ok(())
    }

    pub fn open_settings(&mut self) -> Result<(), PopupError> {
        self.expect_idle("open settings")?;
        let token_input = match self.relay.token() {
            Ok(token) => token.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "failed to load token");
                String::new()
            }
        };
        self.state = PopupState::Settings {
            token_input,
            error: None,
        };
        Ok(())
    }

    /// Replaces the contents of the token field.
    pub fn set_token_input(&mut self, value: &str) -> Result<(), PopupError> {
        match &mut self.state {
            PopupState::Settings { token_input, .. } => {
                *token_input = value.to_string();
                Ok(())
            }
            other => Err(PopupError::InvalidState {
                action: "edit the token",
                state: other.name(),
            }),
        }
    }

    /// Validates and persists the token, then closes the popup.
    pub fn save_settings(&mut self) -> Result<(), PopupError> {
        let token = match &mut self.state {
            PopupState::Settings { token_input, error } => {
                let token = token_input.trim().to_string();
                if token.is_empty() {
                    *error = Some("Token cannot be empty".to_string());
                    return Ok(());
                }
                token
            }
            other => {
                return Err(PopupError::InvalidState {
                    action: "save settings",
                    state: other.name(),
                })
            }
        };

        match self.relay.set_token(&token) {
            Ok(()) => self.state = PopupState::Closed,
            Err(e) => {
                if let PopupState::Settings { error, .. } = &mut self.state {
                    *error = Some(format!("Failed to save token: {}", e));
                }
            }
        }
        Ok(())
    }

    /// Leaves settings without saving.
    pub fn cancel_settings(&mut self) -> Result<(), PopupError> {
        match self.state {
            PopupState::Settings { .. } => {
                self.state = PopupState::Idle;
                Ok(())
            }
            ref other => Err(PopupError::InvalidState {
                action: "cancel settings",
                state: other.name(),
            }),
        }
    }

    /// Closes the error or selection modal.
    pub fn dismiss(&mut self) -> Result<(), PopupError> {
        match self.state {
            PopupState::Error { .. } | PopupState::Selection { .. } => {
                self.state = PopupState::Idle;
                Ok(())
            }
            ref other => Err(PopupError::InvalidState {
                action: "dismiss",
                state: other.name(),
            }),
        }
    }

    pub fn close(&mut self) {
        self.state = PopupState::Closed;
    }

    fn show_error(&mut self, title: &str, message: &str) {
        self.state = PopupState::Error {
            title: title.to_string(),
            message: message.to_string(),
        };
    }

    fn expect_idle(&self, action: &'static str) -> Result<(), PopupError> {
        match self.state {
            PopupState::Idle => Ok(()),
            ref other => Err(PopupError::InvalidState {
                action,
                state: other.name(),
            }),
        }
    }
}
