use std::fmt;

// === RelayError ===

/// Errors surfaced by the message relay while serving a fill request.
#[derive(Debug, Clone, PartialEq)]
pub enum RelayError {
    /// No auth token has been saved yet.
    AuthTokenMissing,
    /// The credential service (HTTP port or native host) could not be reached.
    TransportUnreachable(String),
    /// The credential service did not answer within the configured bound.
    Timeout,
    /// The credential service explicitly reported a failure.
    ServiceError(String),
    /// No credentials are stored for the given domain.
    NotFound(String),
    /// The page could not be filled (tab gone or no login fields).
    FillTargetMissing(String),
    /// The tab URL could not be used as a lookup key.
    InvalidUrl(String),
    /// The service answered with something that is not a known response shape.
    Protocol(String),
    /// The token could not be read from or written to extension storage.
    Storage(String),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::AuthTokenMissing => write!(
                f,
                "Authentication token not set. Please configure in extension settings."
            ),
            RelayError::TransportUnreachable(msg) => {
                write!(f, "Failed to connect to password manager: {}", msg)
            }
            RelayError::Timeout => write!(f, "timeout"),
            RelayError::ServiceError(msg) => write!(f, "{}", msg),
            RelayError::NotFound(domain) => write!(f, "No credentials found for {}", domain),
            RelayError::FillTargetMissing(msg) => write!(f, "Could not fill the login form: {}", msg),
            RelayError::InvalidUrl(url) => write!(f, "Invalid page URL: {}", url),
            RelayError::Protocol(msg) => write!(f, "Unexpected response from password manager: {}", msg),
            RelayError::Storage(msg) => write!(f, "Extension storage error: {}", msg),
        }
    }
}

impl std::error::Error for RelayError {}

// === StorageError ===

/// Errors related to the extension-local storage area.
#[derive(Debug)]
pub enum StorageError {
    /// Database operation failed.
    DatabaseError(String),
    /// A stored value could not be encoded or decoded.
    SerializationError(String),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::DatabaseError(msg) => write!(f, "Storage database error: {}", msg),
            StorageError::SerializationError(msg) => {
                write!(f, "Storage serialization error: {}", msg)
            }
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for RelayError {
    fn from(e: StorageError) -> Self {
        RelayError::Storage(e.to_string())
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        StorageError::DatabaseError(e.to_string())
    }
}

// === SettingsError ===

/// Errors related to settings management.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// The provided settings key is invalid.
    InvalidKey(String),
    /// The provided settings value is invalid.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidKey(key) => write!(f, "Invalid settings key: {}", key),
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}

// === TabError ===

/// Errors related to tab bookkeeping.
#[derive(Debug, PartialEq)]
pub enum TabError {
    /// Tab with the given ID was not found.
    NotFound(String),
    /// There is no active tab to act on.
    NoActiveTab,
    /// The tab has no content script listening for messages.
    NoReceiver(String),
}

impl fmt::Display for TabError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TabError::NotFound(id) => write!(f, "Tab not found: {}", id),
            TabError::NoActiveTab => write!(f, "Could not determine current page"),
            TabError::NoReceiver(id) => {
                write!(f, "No content script in tab {}: receiving end does not exist", id)
            }
        }
    }
}

impl std::error::Error for TabError {}

impl From<TabError> for RelayError {
    fn from(e: TabError) -> Self {
        RelayError::FillTargetMissing(e.to_string())
    }
}

// === ClipboardError ===

/// Errors related to filling from clipboard text.
#[derive(Debug, PartialEq)]
pub enum ClipboardError {
    /// The clipboard does not hold `username\npassword`.
    InvalidFormat,
    /// One of the two lines is blank.
    MissingField,
    /// The clipboard could not be read or cleared.
    Unavailable(String),
    /// The credentials were parsed but could not be delivered to the page.
    Fill(String),
}

impl fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClipboardError::InvalidFormat => write!(f, "No valid credentials in clipboard."),
            ClipboardError::MissingField => write!(f, "Invalid clipboard format"),
            ClipboardError::Unavailable(msg) => write!(f, "Clipboard unavailable: {}", msg),
            ClipboardError::Fill(msg) => write!(f, "Failed to fill: {}", msg),
        }
    }
}

impl std::error::Error for ClipboardError {}

// === PopupError ===

/// Errors raised when a popup action does not apply to the current state.
#[derive(Debug, Clone, PartialEq)]
pub enum PopupError {
    /// The action is not available in the popup's current state.
    InvalidState { action: &'static str, state: &'static str },
    /// The selected entry index is out of range.
    NoSuchEntry(usize),
}

impl fmt::Display for PopupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PopupError::InvalidState { action, state } => {
                write!(f, "Cannot {} while popup is {}", action, state)
            }
            PopupError::NoSuchEntry(index) => write!(f, "No entry at position {}", index),
        }
    }
}

impl std::error::Error for PopupError {}
