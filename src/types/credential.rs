use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use super::errors::RelayError;

/// A credential record handed out by the password manager for one fill cycle.
///
/// Never persisted by this client. The fields are wiped when the entry is dropped.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
pub struct CredentialEntry {
    /// URL or origin the entry was saved for (may be empty).
    #[serde(default)]
    pub url: String,
    pub username: String,
    pub password: String,
    /// Display name of the entry, when the service provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl CredentialEntry {
    pub fn new(url: &str, username: &str, password: &str) -> Self {
        Self {
            url: url.to_string(),
            username: username.to_string(),
            password: password.to_string(),
            name: None,
        }
    }

    /// Label shown in the selection list: entry name, else url, else "Unnamed".
    pub fn label(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ if !self.url.is_empty() => &self.url,
            _ => "Unnamed",
        }
    }
}

impl fmt::Debug for CredentialEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialEntry")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .finish()
    }
}

/// A request from the popup to look up credentials for a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FillRequest {
    pub target_url: String,
}

/// The normalized answer of the credential service.
///
/// Every transport maps its own response shape onto this union.
#[derive(Debug, Clone, PartialEq)]
pub enum FillResponse {
    Single(CredentialEntry),
    Multiple(Vec<CredentialEntry>),
    NotFound,
    Error(String),
}

impl FillResponse {
    /// Builds a response from a candidate list, collapsing one entry to `Single`.
    pub fn from_entries(mut entries: Vec<CredentialEntry>) -> Self {
        match entries.len() {
            0 => FillResponse::NotFound,
            1 => FillResponse::Single(entries.remove(0)),
            _ => FillResponse::Multiple(entries),
        }
    }
}

/// Entry shape shared by the HTTP and native wire formats. Every field may be null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WireEntry {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub entryname: Option<String>,
}

impl From<WireEntry> for CredentialEntry {
    fn from(wire: WireEntry) -> Self {
        CredentialEntry {
            url: wire.url.unwrap_or_default(),
            username: wire.username.unwrap_or_default(),
            password: wire.password.unwrap_or_default(),
            name: wire.entryname,
        }
    }
}

// === HTTP wire format ===

/// Body POSTed to the local credential service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpFillRequest {
    pub action: String,
    pub url: String,
    pub token: String,
}

impl HttpFillRequest {
    pub fn fill(url: &str, token: &str) -> Self {
        Self {
            action: "fill".to_string(),
            url: url.to_string(),
            token: token.to_string(),
        }
    }
}

/// Any body the HTTP service may answer with.
///
/// `{status:"ok", mode:"single"|"multiple", ...}`, `{status:"not_found"}`,
/// `{status:"error", message}`, or a bare `{error}` on 401 / bad requests.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HttpServiceResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub mode: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub entries: Option<Vec<WireEntry>>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl TryFrom<HttpServiceResponse> for FillResponse {
    type Error = RelayError;

    fn try_from(resp: HttpServiceResponse) -> Result<Self, RelayError> {
        if let Some(error) = resp.error {
            return Ok(FillResponse::Error(error));
        }

        match (resp.status.as_deref(), resp.mode.as_deref()) {
            (Some("not_found"), _) => Ok(FillResponse::NotFound),
            (Some("error"), _) => Ok(FillResponse::Error(
                resp.message.unwrap_or_else(|| "Unknown error".to_string()),
            )),
            (Some("ok"), Some("single")) => Ok(FillResponse::Single(CredentialEntry::from(
                WireEntry {
                    url: resp.url,
                    username: resp.username,
                    password: resp.password,
                    entryname: None,
                },
            ))),
            (Some("ok"), Some("multiple")) => match resp.entries {
                Some(entries) => Ok(FillResponse::from_entries(
                    entries.into_iter().map(CredentialEntry::from).collect(),
                )),
                None => Err(RelayError::Protocol("multiple mode without entries".to_string())),
            },
            (status, mode) => Err(RelayError::Protocol(format!(
                "status={:?} mode={:?}",
                status, mode
            ))),
        }
    }
}

// === Native-messaging wire format ===

/// Message written to the native host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeRequest {
    pub origin: String,
    /// Correlation id echoed back by hosts that support it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Message read back from the native host.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NativeResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub found: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entryname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entries: Option<Vec<WireEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NativeResponse {
    /// Normalizes the host's answer for a lookup of `origin`.
    pub fn into_fill_response(self, origin: &str) -> Result<FillResponse, RelayError> {
        if let Some(error) = self.error {
            return Ok(FillResponse::Error(error));
        }

        if let Some(entries) = self.entries {
            return Ok(FillResponse::from_entries(
                entries
                    .into_iter()
                    .map(|e| {
                        let mut entry = CredentialEntry::from(e);
                        if entry.url.is_empty() {
                            entry.url = origin.to_string();
                        }
                        entry
                    })
                    .collect(),
            ));
        }

        match self.found {
            Some(true) => Ok(FillResponse::Single(CredentialEntry::from(WireEntry {
                url: Some(origin.to_string()),
                username: self.username,
                password: self.password,
                entryname: self.entryname,
            }))),
            Some(false) => Ok(FillResponse::NotFound),
            None => Err(RelayError::Protocol(
                "native response has neither found, entries nor error".to_string(),
            )),
        }
    }
}
