//! Runtime-message handler for the background relay.
//!
//! Split out of `rpc_server.rs` so it can be unit-tested without stdio.
//! `handle_message` dispatches one popup or CLI message to the relay and
//! tab manager and returns the JSON reply the caller expects.

use serde_json::{json, Value};
use tracing::debug;

use crate::app::App;
use crate::managers::tab_manager::TabManagerTrait;
use crate::services::clipboard_fill::Clipboard;
use crate::services::message_relay::FillOutcome;
use crate::types::credential::CredentialEntry;
use crate::types::errors::RelayError;
use crate::types::message::RuntimeMessage;
use crate::types::tab::TabContext;

fn entry_json(entry: &CredentialEntry) -> Value {
    json!({
        "url": entry.url,
        "username": entry.username,
        "password": entry.password,
        "name": entry.name,
    })
}

/// Reply sent back to the popup for a failed fill. Not-found is a normal
/// answer, not an error.
fn relay_error_json(err: &RelayError) -> Value {
    match err {
        RelayError::NotFound(domain) => json!({"status": "not_found", "domain": domain}),
        other => json!({"error": other.to_string()}),
    }
}

/// Resolves the tab a fill applies to: the named tab, else the active one.
fn fill_context(app: &App, tab_id: Option<&str>, url: Option<&str>) -> Result<TabContext, String> {
    let tabs = app.tabs.lock().map_err(|e| e.to_string())?;
    let mut ctx = match tab_id {
        Some(id) => tabs
            .get_tab(id)
            .map(TabContext::from)
            .ok_or_else(|| format!("Tab not found: {}", id))?,
        None => tabs.active_context().map_err(|e| e.to_string())?,
    };
    if let Some(url) = url {
        ctx.url = url.to_string();
    }
    Ok(ctx)
}

fn active_tab_id(app: &App) -> Result<String, String> {
    let tabs = app.tabs.lock().map_err(|e| e.to_string())?;
    tabs.get_active_tab()
        .map(|t| t.id.clone())
        .ok_or_else(|| "Could not determine current page".to_string())
}

/// Dispatch one runtime message.
///
/// Returns `Ok(Value)` with the reply, or `Err(String)` when the message
/// itself could not be served (unknown tab, storage failure).
pub async fn handle_message(app: &App, message: RuntimeMessage) -> Result<Value, String> {
    match message {
        RuntimeMessage::Fill { url, tab_id } => {
            let ctx = fill_context(app, tab_id.as_deref(), url.as_deref())?;
            debug!(tab = %ctx.tab_id, url = %ctx.url, "fill requested");
            match app.relay.request_fill(&ctx).await {
                Ok(FillOutcome::Filled { tab_id, report }) => Ok(json!({
                    "status": "ok",
                    "mode": "single",
                    "tabId": tab_id,
                    "usernameFilled": report.username_filled,
                    "passwordFilled": report.password_filled,
                })),
                Ok(FillOutcome::Choose { tab_id, entries }) => Ok(json!({
                    "status": "ok",
                    "mode": "multiple",
                    "tabId": tab_id,
                    "entries": entries.iter().map(entry_json).collect::<Vec<_>>(),
                })),
                Err(e) => Ok(relay_error_json(&e)),
            }
        }

        RuntimeMessage::SetToken { token } => {
            app.relay.set_token(&token).map_err(|e| e.to_string())?;
            Ok(json!({"success": true}))
        }

        RuntimeMessage::ClearToken => {
            app.relay.clear_token().map_err(|e| e.to_string())?;
            Ok(json!({"success": true}))
        }

        RuntimeMessage::FillEntry {
            tab_id,
            username,
            password,
        } => {
            let entry = CredentialEntry::new("", &username, &password);
            match app.relay.fill_tab(&tab_id, &entry) {
                Ok(report) => Ok(json!({
                    "success": true,
                    "usernameFilled": report.username_filled,
                    "passwordFilled": report.password_filled,
                })),
                Err(e) => Ok(relay_error_json(&e)),
            }
        }

        RuntimeMessage::FillClipboard { tab_id } => {
            let tab_id = match tab_id {
                Some(id) => id,
                None => active_tab_id(app)?,
            };
            let mut clipboard = app.clipboard.lock().map_err(|e| e.to_string())?;
            match app.relay.fill_from_clipboard(&tab_id, &mut *clipboard) {
                Ok(report) => Ok(json!({
                    "success": true,
                    "usernameFilled": report.username_filled,
                    "passwordFilled": report.password_filled,
                })),
                Err(e) => Ok(json!({"error": e.to_string()})),
            }
        }

        RuntimeMessage::SetClipboard { text } => {
            let mut clipboard = app.clipboard.lock().map_err(|e| e.to_string())?;
            clipboard.write_text(&text).map_err(|e| e.to_string())?;
            Ok(json!({"success": true}))
        }

        RuntimeMessage::OpenTab { url, html, active } => {
            let mut tabs = app.tabs.lock().map_err(|e| e.to_string())?;
            let id = tabs.open_tab(&url, html.as_deref(), active);
            Ok(json!({"tabId": id}))
        }

        RuntimeMessage::CloseTab { tab_id } => {
            let mut tabs = app.tabs.lock().map_err(|e| e.to_string())?;
            tabs.close_tab(&tab_id).map_err(|e| e.to_string())?;
            Ok(json!({"success": true}))
        }

        RuntimeMessage::ListTabs => {
            let tabs = app.tabs.lock().map_err(|e| e.to_string())?;
            let active = tabs.get_active_tab().map(|t| t.id.clone());
            let arr: Vec<Value> = tabs
                .get_all_tabs()
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "url": t.url,
                        "scriptable": t.scriptable,
                        "active": active.as_deref() == Some(t.id.as_str()),
                    })
                })
                .collect();
            Ok(json!(arr))
        }

        RuntimeMessage::Locate { tab_id } => {
            let tab_id = match tab_id {
                Some(id) => id,
                None => active_tab_id(app)?,
            };
            let tabs = app.tabs.lock().map_err(|e| e.to_string())?;
            let script = tabs
                .content_script(&tab_id)
                .ok_or_else(|| format!("No content script in tab {}", tab_id))?;
            let fields = script.locate();
            let describe = |id: Option<usize>| {
                id.and_then(|id| script.document().input(id)).map(|input| {
                    json!({
                        "index": input.id,
                        "name": input.attr("name"),
                        "id": input.attr("id"),
                        "type": input.input_type(),
                    })
                })
            };
            Ok(json!({
                "username": describe(fields.username),
                "password": describe(fields.password),
            }))
        }

        RuntimeMessage::Ping => Ok(json!({"pong": true, "version": env!("CARGO_PKG_VERSION")})),
    }
}
