//! Owned model of the parts of a page that matter for login autofill.
//!
//! Only `<form>` and `<input>` elements are kept. Inputs remember their
//! enclosing form, their attributes, a mutable value slot, and every
//! synthetic event dispatched at them, so fills can be observed the way
//! page scripts would observe them.

use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Index of an input element in document order.
pub type ElementId = usize;

/// Synthetic event kinds emitted by a fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Input,
    Change,
}

/// A dispatched event, as recorded by the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomEvent {
    pub target: ElementId,
    pub kind: EventKind,
    pub bubbles: bool,
}

/// A `<form>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct FormElement {
    pub index: usize,
    attributes: Vec<(String, String)>,
}

impl FormElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        lookup(&self.attributes, name)
    }
}

/// An `<input>` element.
#[derive(Debug, Clone, PartialEq)]
pub struct InputElement {
    pub id: ElementId,
    attributes: Vec<(String, String)>,
    pub value: String,
    /// Index of the `<form>` the input sits inside, if any.
    pub enclosing_form: Option<usize>,
}

impl InputElement {
    pub fn attr(&self, name: &str) -> Option<&str> {
        lookup(&self.attributes, name)
    }

    /// The `type` attribute, lowercased. `None` when the attribute is absent.
    pub fn input_type(&self) -> Option<String> {
        self.attr("type").map(|t| t.trim().to_ascii_lowercase())
    }

    pub fn is_password(&self) -> bool {
        self.input_type().as_deref() == Some("password")
    }

    /// Matches `input[type="text"], input[type="email"], input:not([type])`.
    pub fn is_text_like(&self) -> bool {
        match self.input_type().as_deref() {
            None => true,
            Some("text") | Some("email") => true,
            _ => false,
        }
    }

    /// First non-empty of name, id, placeholder, used by the name heuristics.
    pub fn identifying_text(&self) -> &str {
        ["name", "id", "placeholder"]
            .iter()
            .filter_map(|a| self.attr(a))
            .find(|v| !v.is_empty())
            .unwrap_or("")
    }
}

/// A parsed page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    forms: Vec<FormElement>,
    inputs: Vec<InputElement>,
    events: Vec<DomEvent>,
}

impl Document {
    /// Builds a document from page HTML.
    ///
    /// The scanner is lenient: unknown tags are skipped, comments and the
    /// bodies of `<script>`, `<style>` and `<textarea>` are ignored, and a
    /// `<form>` opened inside another form is ignored as browsers do.
    pub fn parse(html: &str) -> Self {
        let mut doc = Document::default();
        let mut current_form: Option<usize> = None;
        let mut rest = html;

        while let Some(lt) = rest.find('<') {
            rest = &rest[lt..];

            if rest.starts_with("<!--") {
                match rest.find("-->") {
                    Some(end) => {
                        rest = &rest[end + 3..];
                        continue;
                    }
                    None => break,
                }
            }

            // A `<` that cannot start a tag is text, as in `a < b`.
            let starts_tag = rest[1..]
                .chars()
                .next()
                .map_or(false, |c| c.is_ascii_alphabetic() || c == '/' || c == '!');
            if !starts_tag {
                rest = &rest[1..];
                continue;
            }

            let gt = match find_tag_end(rest) {
                Some(gt) => gt,
                None => break,
            };
            let tag = &rest[1..gt];
            rest = &rest[gt + 1..];

            let (closing, body) = match tag.strip_prefix('/') {
                Some(body) => (true, body),
                None => (false, tag),
            };
            let name_end = body
                .find(|c: char| c.is_whitespace() || c == '/')
                .unwrap_or(body.len());
            let name = body[..name_end].to_ascii_lowercase();
            let attr_src = &body[name_end..];

            match (closing, name.as_str()) {
                (false, "form") => {
                    if current_form.is_none() {
                        let index = doc.forms.len();
                        doc.forms.push(FormElement {
                            index,
                            attributes: parse_attributes(attr_src),
                        });
                        current_form = Some(index);
                    }
                }
                (true, "form") => current_form = None,
                (false, "input") => {
                    let attributes = parse_attributes(attr_src);
                    let value = lookup(&attributes, "value").unwrap_or("").to_string();
                    doc.inputs.push(InputElement {
                        id: doc.inputs.len(),
                        attributes,
                        value,
                        enclosing_form: current_form,
                    });
                }
                (false, "script") | (false, "style") | (false, "textarea") => {
                    let close = format!("</{}", name);
                    match rest.to_ascii_lowercase().find(&close) {
                        Some(end) => rest = &rest[end..],
                        None => break,
                    }
                }
                _ => {}
            }
        }

        doc
    }

    pub fn inputs(&self) -> &[InputElement] {
        &self.inputs
    }

    pub fn forms(&self) -> &[FormElement] {
        &self.forms
    }

    pub fn input(&self, id: ElementId) -> Option<&InputElement> {
        self.inputs.get(id)
    }

    /// The form that owns an input: the form named by its `form` attribute
    /// when that id exists, otherwise the enclosing form.
    pub fn form_of(&self, id: ElementId) -> Option<usize> {
        let input = self.inputs.get(id)?;
        if let Some(form_id) = input.attr("form") {
            if let Some(form) = self.forms.iter().find(|f| f.attr("id") == Some(form_id)) {
                return Some(form.index);
            }
        }
        input.enclosing_form
    }

    /// Inputs owned by `form`, in document order.
    pub fn inputs_in_form(&self, form: usize) -> impl Iterator<Item = &InputElement> {
        self.inputs
            .iter()
            .filter(move |i| self.form_of(i.id) == Some(form))
    }

    /// Sets an input's value. Returns false when the element does not exist.
    pub fn set_value(&mut self, id: ElementId, value: &str) -> bool {
        match self.inputs.get_mut(id) {
            Some(input) => {
                input.value = value.to_string();
                true
            }
            None => false,
        }
    }

    pub fn dispatch_event(&mut self, target: ElementId, kind: EventKind) {
        self.events.push(DomEvent {
            target,
            kind,
            bubbles: true,
        });
    }

    pub fn events(&self) -> &[DomEvent] {
        &self.events
    }

    /// Events dispatched at one element, in order.
    pub fn events_for(&self, target: ElementId) -> Vec<EventKind> {
        self.events
            .iter()
            .filter(|e| e.target == target)
            .map(|e| e.kind)
            .collect()
    }
}

fn lookup<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(name))
        .map(|(_, v)| v.as_str())
}

/// Position of the `>` closing a tag that starts at index 0, skipping quoted values.
fn find_tag_end(src: &str) -> Option<usize> {
    let mut quote: Option<char> = None;
    for (i, c) in src.char_indices().skip(1) {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(i),
            _ => {}
        }
    }
    None
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"([^\s"'<>/=]+)(?:\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'=<>`]+)))?"#)
            .expect("attribute pattern is valid")
    })
}

/// Parses `name="value"` pairs. Names are lowercased; the first occurrence wins.
fn parse_attributes(src: &str) -> Vec<(String, String)> {
    let mut attributes: Vec<(String, String)> = Vec::new();
    for cap in attribute_regex().captures_iter(src) {
        let name = cap[1].to_ascii_lowercase();
        if attributes.iter().any(|(k, _)| *k == name) {
            continue;
        }
        let value = cap
            .get(2)
            .or_else(|| cap.get(3))
            .or_else(|| cap.get(4))
            .map(|m| decode_entities(m.as_str()))
            .unwrap_or_default();
        attributes.push((name, value));
    }
    attributes
}

fn decode_entities(raw: &str) -> String {
    if !raw.contains('&') {
        return raw.to_string();
    }
    raw.replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}
