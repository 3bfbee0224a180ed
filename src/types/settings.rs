use serde::{Deserialize, Serialize};
use url::Url;

use crate::types::errors::SettingsError;

/// Top-level client settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RelaySettings {
    pub transport: TransportSettings,
    pub fill: FillSettings,
    pub popup: PopupSettings,
}

impl RelaySettings {
    /// Checks constraints that span fields or that serde cannot express.
    pub fn validate(&self) -> Result<(), SettingsError> {
        let transport = &self.transport;
        if transport.request_timeout_ms == 0 {
            return Err(invalid("transport.request_timeout_ms must be positive"));
        }
        match Url::parse(&transport.server_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(invalid(format!(
                    "transport.server_url '{}' is not an http(s) URL",
                    transport.server_url
                )))
            }
        }
        if transport.kind == TransportKind::Native && transport.native_host.command.trim().is_empty() {
            return Err(invalid("transport.native_host.command is required for the native transport"));
        }
        if self.popup.min_height > self.popup.max_height {
            return Err(invalid("popup.min_height must not exceed popup.max_height"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> SettingsError {
    SettingsError::InvalidValue(message.into())
}

impl Default for RelaySettings {
    fn default() -> Self {
        Self {
            transport: TransportSettings::default(),
            fill: FillSettings::default(),
            popup: PopupSettings::default(),
        }
    }
}

/// How the relay reaches the password manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransportSettings {
    pub kind: TransportKind,
    /// Base URL of the HTTP extension server.
    pub server_url: String,
    /// Bound on the wait for the service's answer, in milliseconds.
    pub request_timeout_ms: u64,
    pub native_host: NativeHostSettings,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            kind: TransportKind::Http,
            server_url: "http://127.0.0.1:9123".to_string(),
            request_timeout_ms: 5000,
            native_host: NativeHostSettings::default(),
        }
    }
}

/// Which transport variant is active.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    Http,
    Native,
}

/// How to launch the native-messaging host process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NativeHostSettings {
    /// Registered host name, reported in logs.
    pub name: String,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for NativeHostSettings {
    fn default() -> Self {
        Self {
            name: "com.passfill.native_host".to_string(),
            command: "password-manager".to_string(),
            args: vec!["--native-host".to_string()],
        }
    }
}

/// Page-side fill behavior.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FillSettings {
    pub locator_strategy: LocatorStrategy,
}

impl Default for FillSettings {
    fn default() -> Self {
        Self {
            locator_strategy: LocatorStrategy::Scoped,
        }
    }
}

/// Field-locating heuristic used by content scripts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LocatorStrategy {
    /// Password input first, then a text input in the same form, then name heuristics.
    Scoped,
    /// Attribute selectors only (`name*=user`, `type=email`, `autocomplete=username`).
    Attribute,
}

/// Popup sizing bounds, in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PopupSettings {
    pub min_height: u32,
    pub max_height: u32,
    /// Space added around modal content for the popup chrome.
    pub chrome_padding: u32,
}

impl Default for PopupSettings {
    fn default() -> Self {
        Self {
            min_height: 260,
            max_height: 600,
            chrome_padding: 80,
        }
    }
}
