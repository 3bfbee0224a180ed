use serde::{Deserialize, Serialize};

/// Represents a browser tab the extension can message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    pub id: String,
    pub url: String,
    pub title: String,
    /// False when no content script is listening (e.g. `about:` pages).
    pub scriptable: bool,
    pub created_at: i64,
}

/// The tab a fill request originated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabContext {
    pub tab_id: String,
    pub url: String,
}

impl From<&Tab> for TabContext {
    fn from(tab: &Tab) -> Self {
        Self {
            tab_id: tab.id.clone(),
            url: tab.url.clone(),
        }
    }
}
