use serde::{Deserialize, Serialize};

/// Messages the popup sends to the background relay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum RuntimeMessage {
    /// Look up credentials and fill the requesting tab. Without `url` the
    /// tab's own URL is used; without `tabId` the active tab.
    Fill {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
        #[serde(default, rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },
    /// Persist a new auth token.
    SetToken { token: String },
    /// Forget the stored auth token.
    ClearToken,
    /// Fill a specific tab with an entry the user picked.
    FillEntry {
        #[serde(rename = "tabId")]
        tab_id: String,
        username: String,
        password: String,
    },
    /// Fill from `username\npassword` clipboard text.
    FillClipboard {
        #[serde(default, rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },
    SetClipboard { text: String },
    /// Load a page into a new tab. Without `html` the tab has no content script.
    OpenTab {
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        html: Option<String>,
        #[serde(default = "default_true")]
        active: bool,
    },
    CloseTab {
        #[serde(rename = "tabId")]
        tab_id: String,
    },
    ListTabs,
    /// Report which login fields the content script would fill.
    Locate {
        #[serde(default, rename = "tabId", skip_serializing_if = "Option::is_none")]
        tab_id: Option<String>,
    },
    Ping,
}

fn default_true() -> bool {
    true
}

/// Messages the background relay delivers to a page's content script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ContentMessage {
    Fill {
        #[serde(default)]
        username: Option<String>,
        #[serde(default)]
        password: Option<String>,
    },
}
