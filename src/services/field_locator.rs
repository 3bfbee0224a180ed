//! Field Locator for passfill.
//!
//! Finds the best-guess username and password inputs of a login form.

use std::sync::OnceLock;

use regex::Regex;

use crate::types::dom::{Document, ElementId, InputElement};
use crate::types::settings::LocatorStrategy;

/// The inputs a fill should write into. Either side may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LocatedFields {
    pub username: Option<ElementId>,
    pub password: Option<ElementId>,
}

impl LocatedFields {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// Trait defining field-locating operations.
pub trait FieldLocatorTrait {
    fn locate(&self, document: &Document) -> LocatedFields;
}

/// Heuristic field locator.
pub struct FieldLocator {
    strategy: LocatorStrategy,
}

impl FieldLocator {
    pub fn new(strategy: LocatorStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> LocatorStrategy {
        self.strategy
    }

    /// Password input first; the username is the first text-like input in the
    /// password's form, or in the whole document when it has no form. Pages
    /// without a password input fall back to name/id/placeholder matching.
    fn locate_scoped(document: &Document) -> LocatedFields {
        let password = document.inputs().iter().find(|i| i.is_password());

        if let Some(password) = password {
            let username = match document.form_of(password.id) {
                Some(form) => document
                    .inputs_in_form(form)
                    .find(|i| i.is_text_like())
                    .map(|i| i.id),
                None => document
                    .inputs()
                    .iter()
                    .find(|i| i.is_text_like())
                    .map(|i| i.id),
            };
            return LocatedFields {
                username,
                password: Some(password.id),
            };
        }

        let username = document
            .inputs()
            .iter()
            .find(|i| username_pattern().is_match(i.identifying_text()))
            .map(|i| i.id);
        let password = document
            .inputs()
            .iter()
            .find(|i| password_pattern().is_match(i.identifying_text()))
            .map(|i| i.id);

        LocatedFields { username, password }
    }

    /// Selector-only variant: `input[type=text][name*=user i]`,
    /// `input[type=text][id*=user i]`, `input[type=email]`,
    /// `input[autocomplete=username]`; password is the first `type=password`.
    fn locate_by_attribute(document: &Document) -> LocatedFields {
        let username = document
            .inputs()
            .iter()
            .find(|i| Self::matches_username_selector(i))
            .map(|i| i.id);
        let password = document
            .inputs()
            .iter()
            .find(|i| i.is_password())
            .map(|i| i.id);

        LocatedFields { username, password }
    }

    fn matches_username_selector(input: &InputElement) -> bool {
        let ty = input.input_type();
        let contains_user = |attr: &str| {
            input
                .attr(attr)
                .map(|v| v.to_lowercase().contains("user"))
                .unwrap_or(false)
        };

        (ty.as_deref() == Some("text") && (contains_user("name") || contains_user("id")))
            || ty.as_deref() == Some("email")
            || input.attr("autocomplete") == Some("username")
    }
}

impl Default for FieldLocator {
    fn default() -> Self {
        Self::new(LocatorStrategy::Scoped)
    }
}

impl FieldLocatorTrait for FieldLocator {
    fn locate(&self, document: &Document) -> LocatedFields {
        match self.strategy {
            LocatorStrategy::Scoped => Self::locate_scoped(document),
            LocatorStrategy::Attribute => Self::locate_by_attribute(document),
        }
    }
}

fn username_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)user|email|login|username").expect("username pattern is valid"))
}

fn password_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)pass|password").expect("password pattern is valid"))
}
