//! Fill from clipboard text.
//!
//! The user copies `username\npassword` from the password manager CLI and
//! triggers a fill. The clipboard is cleared once the page has been filled.

use zeroize::Zeroizing;

use crate::managers::tab_manager::TabManagerTrait;
use crate::services::form_filler::FillReport;
use crate::types::errors::ClipboardError;
use crate::types::message::ContentMessage;

pub trait Clipboard: Send {
    fn read_text(&mut self) -> Result<String, ClipboardError>;
    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// Process-local clipboard, used by the background host and tests.
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    contents: Zeroizing<String>,
}

impl MemoryClipboard {
    pub fn new(contents: &str) -> Self {
        Self {
            contents: Zeroizing::new(contents.to_string()),
        }
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String, ClipboardError> {
        Ok(self.contents.to_string())
    }

    fn write_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        self.contents = Zeroizing::new(text.to_string());
        Ok(())
    }
}

/// Splits clipboard text into `(username, password)`. Only the first two
/// lines are used and both are trimmed.
pub fn parse_clipboard_credentials(
    text: &str,
) -> Result<(Zeroizing<String>, Zeroizing<String>), ClipboardError> {
    if !text.contains('\n') {
        return Err(ClipboardError::InvalidFormat);
    }
    let mut lines = text.split('\n');
    let username = lines.next().unwrap_or_default().trim();
    let password = lines.next().unwrap_or_default().trim();
    if username.is_empty() || password.is_empty() {
        return Err(ClipboardError::MissingField);
    }
    Ok((
        Zeroizing::new(username.to_string()),
        Zeroizing::new(password.to_string()),
    ))
}

/// Reads credentials from `clipboard`, fills them into `tab_id` and clears
/// the clipboard. The clipboard is left untouched when anything fails.
pub fn fill_from_clipboard<T: TabManagerTrait + ?Sized>(
    tabs: &mut T,
    tab_id: &str,
    clipboard: &mut dyn Clipboard,
) -> Result<FillReport, ClipboardError> {
    let text = Zeroizing::new(clipboard.read_text()?);
    let (username, password) = parse_clipboard_credentials(&text)?;

    let message = ContentMessage::Fill {
        username: Some(username.to_string()),
        password: Some(password.to_string()),
    };
    let report = tabs
        .send_message(tab_id, &message)
        .map_err(|e| ClipboardError::Fill(e.to_string()))?;

    clipboard.write_text("")?;
    Ok(report)
}
