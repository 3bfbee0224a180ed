use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::services::content_script::ContentScript;
use crate::services::form_filler::FillReport;
use crate::types::errors::TabError;
use crate::types::message::ContentMessage;
use crate::types::settings::LocatorStrategy;
use crate::types::tab::{Tab, TabContext};

/// Trait defining the tab bookkeeping interface.
pub trait TabManagerTrait {
    fn open_tab(&mut self, url: &str, html: Option<&str>, active: bool) -> String;
    fn close_tab(&mut self, tab_id: &str) -> Result<(), TabError>;
    fn switch_tab(&mut self, tab_id: &str) -> Result<(), TabError>;
    fn get_tab(&self, tab_id: &str) -> Option<&Tab>;
    fn get_all_tabs(&self) -> Vec<&Tab>;
    fn get_active_tab(&self) -> Option<&Tab>;
    fn active_context(&self) -> Result<TabContext, TabError>;
    fn send_message(&mut self, tab_id: &str, message: &ContentMessage) -> Result<FillReport, TabError>;
    fn content_script(&self, tab_id: &str) -> Option<&ContentScript>;
    fn tab_count(&self) -> usize;
    fn update_tab_url(&mut self, tab_id: &str, url: &str) -> Result<(), TabError>;
}

/// In-memory tab registry. Each tab loaded with page HTML gets a content script.
pub struct TabManager {
    tabs: Vec<Tab>,
    scripts: HashMap<String, ContentScript>,
    active_tab_id: Option<String>,
    strategy: LocatorStrategy,
}

impl TabManager {
    pub fn new(strategy: LocatorStrategy) -> Self {
        Self {
            tabs: Vec::new(),
            scripts: HashMap::new(),
            active_tab_id: None,
            strategy,
        }
    }

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs() as i64
    }

    fn find_tab_index(&self, tab_id: &str) -> Option<usize> {
        self.tabs.iter().position(|t| t.id == tab_id)
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new(LocatorStrategy::Scoped)
    }
}

impl TabManagerTrait for TabManager {
    /// Open a tab at `url`. With `html`, the page is parsed and a content
    /// script is attached; without it the tab cannot receive messages.
    /// Returns the new tab's ID.
    fn open_tab(&mut self, url: &str, html: Option<&str>, active: bool) -> String {
        let id = Uuid::new_v4().to_string();
        let tab = Tab {
            id: id.clone(),
            url: url.to_string(),
            title: "New Tab".to_string(),
            scriptable: html.is_some(),
            created_at: Self::now(),
        };
        self.tabs.push(tab);
        if let Some(html) = html {
            self.scripts
                .insert(id.clone(), ContentScript::from_html(html, self.strategy));
        }
        if active || self.active_tab_id.is_none() {
            self.active_tab_id = Some(id.clone());
        }
        id
    }

    /// Close a tab. If it was active, the last remaining tab becomes active.
    fn close_tab(&mut self, tab_id: &str) -> Result<(), TabError> {
        let idx = self
            .find_tab_index(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        self.tabs.remove(idx);
        self.scripts.remove(tab_id);
        if self.active_tab_id.as_deref() == Some(tab_id) {
            self.active_tab_id = self.tabs.last().map(|t| t.id.clone());
        }
        Ok(())
    }

    fn switch_tab(&mut self, tab_id: &str) -> Result<(), TabError> {
        if self.find_tab_index(tab_id).is_none() {
            return Err(TabError::NotFound(tab_id.to_string()));
        }
        self.active_tab_id = Some(tab_id.to_string());
        Ok(())
    }

    fn get_tab(&self, tab_id: &str) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id == tab_id)
    }

    fn get_all_tabs(&self) -> Vec<&Tab> {
        self.tabs.iter().collect()
    }

    fn get_active_tab(&self) -> Option<&Tab> {
        self.active_tab_id
            .as_deref()
            .and_then(|id| self.get_tab(id))
    }

    /// Context for a fill request from the active tab. Tabs without a URL
    /// cannot be looked up.
    fn active_context(&self) -> Result<TabContext, TabError> {
        match self.get_active_tab() {
            Some(tab) if !tab.url.is_empty() => Ok(TabContext::from(tab)),
            _ => Err(TabError::NoActiveTab),
        }
    }

    /// Deliver a message to a tab's content script.
    fn send_message(&mut self, tab_id: &str, message: &ContentMessage) -> Result<FillReport, TabError> {
        if self.find_tab_index(tab_id).is_none() {
            return Err(TabError::NotFound(tab_id.to_string()));
        }
        let script = self
            .scripts
            .get_mut(tab_id)
            .ok_or_else(|| TabError::NoReceiver(tab_id.to_string()))?;
        Ok(script.handle_message(message))
    }

    fn content_script(&self, tab_id: &str) -> Option<&ContentScript> {
        self.scripts.get(tab_id)
    }

    fn tab_count(&self) -> usize {
        self.tabs.len()
    }

    fn update_tab_url(&mut self, tab_id: &str, url: &str) -> Result<(), TabError> {
        let idx = self
            .find_tab_index(tab_id)
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        self.tabs[idx].url = url.to_string();
        Ok(())
    }
}
