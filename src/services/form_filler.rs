//! Form Filler for passfill.
//!
//! Writes credential values into located inputs and emits the synthetic
//! `input` and `change` events page scripts listen for.

use serde::Serialize;

use crate::services::field_locator::LocatedFields;
use crate::types::dom::{Document, ElementId, EventKind};

/// Which sides of a login form received a value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    pub username_filled: bool,
    pub password_filled: bool,
}

impl FillReport {
    pub fn any(&self) -> bool {
        self.username_filled || self.password_filled
    }
}

/// Trait defining form-filling operations.
pub trait FormFillerTrait {
    fn fill(
        &self,
        document: &mut Document,
        fields: &LocatedFields,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FillReport;
}

/// Sets values and dispatches one bubbling `input` then one `change` per field.
#[derive(Debug, Default)]
pub struct FormFiller;

impl FormFiller {
    pub fn new() -> Self {
        Self
    }

    fn fill_one(document: &mut Document, field: Option<ElementId>, value: Option<&str>) -> bool {
        let (id, value) = match (field, value) {
            (Some(id), Some(value)) if !value.is_empty() => (id, value),
            _ => return false,
        };
        if !document.set_value(id, value) {
            return false;
        }
        document.dispatch_event(id, EventKind::Input);
        document.dispatch_event(id, EventKind::Change);
        true
    }
}

impl FormFillerTrait for FormFiller {
    fn fill(
        &self,
        document: &mut Document,
        fields: &LocatedFields,
        username: Option<&str>,
        password: Option<&str>,
    ) -> FillReport {
        FillReport {
            username_filled: Self::fill_one(document, fields.username, username),
            password_filled: Self::fill_one(document, fields.password, password),
        }
    }
}
