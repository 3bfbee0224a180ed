//! Content script for passfill.
//!
//! One instance lives in each scriptable tab and owns that tab's document.
//! It answers `{action:"fill", username, password}` messages by locating the
//! login fields and filling them.

use tracing::debug;

use crate::services::field_locator::{FieldLocator, FieldLocatorTrait, LocatedFields};
use crate::services::form_filler::{FillReport, FormFiller, FormFillerTrait};
use crate::types::dom::Document;
use crate::types::message::ContentMessage;
use crate::types::settings::LocatorStrategy;

pub struct ContentScript {
    document: Document,
    locator: FieldLocator,
    filler: FormFiller,
}

impl ContentScript {
    pub fn new(document: Document, strategy: LocatorStrategy) -> Self {
        Self {
            document,
            locator: FieldLocator::new(strategy),
            filler: FormFiller::new(),
        }
    }

    pub fn from_html(html: &str, strategy: LocatorStrategy) -> Self {
        Self::new(Document::parse(html), strategy)
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn locate(&self) -> LocatedFields {
        self.locator.locate(&self.document)
    }

    pub fn handle_message(&mut self, message: &ContentMessage) -> FillReport {
        match message {
            ContentMessage::Fill { username, password } => {
                let fields = self.locator.locate(&self.document);
                debug!(
                    username_field = ?fields.username,
                    password_field = ?fields.password,
                    "located login fields"
                );
                self.filler.fill(
                    &mut self.document,
                    &fields,
                    username.as_deref(),
                    password.as_deref(),
                )
            }
        }
    }
}
