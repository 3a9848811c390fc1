//! Reading and writing element values across control types.
//!
//! Every element falls into one of three [`ControlKind`]s, decided once per
//! access from its tag. Each kind knows how to read a [`ResolvedValue`] and
//! how to write one back. Writes re-read the live state first and do nothing
//! (no events) when the result would be identical; that guard keeps the
//! engine's own writes from feeding the change scheduler forever.

use crate::dom::{ControlEvent, Document, NodeId};
use serde::{Deserialize, Serialize};

/// Value read from an element
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ResolvedValue {
    /// Plain string
    Text(String),
    /// Selection control: underlying value and display label
    Selection {
        /// Selected option's value
        value: String,
        /// Selected option's label
        text: String,
    },
}

impl ResolvedValue {
    /// Plain string value
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Dual selection value
    #[must_use]
    pub fn selection(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Selection {
            value: value.into(),
            text: text.into(),
        }
    }

    /// The string written to a control: the plain text, or the selection's value
    #[must_use]
    pub fn primary(&self) -> &str {
        match self {
            Self::Text(value) | Self::Selection { value, .. } => value,
        }
    }

    /// Whether this is a dual selection value
    #[must_use]
    pub const fn is_selection(&self) -> bool {
        matches!(self, Self::Selection { .. })
    }
}

impl Default for ResolvedValue {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl From<&str> for ResolvedValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for ResolvedValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl std::fmt::Display for ResolvedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text(value) => f.write_str(value),
            Self::Selection { value, text } => write!(f, "{value} ({text})"),
        }
    }
}

/// Closed set of control behaviors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlKind {
    /// `input` and `textarea`: the value property
    TextEntry,
    /// `select`: the selected option
    Selection,
    /// Anything else: rendered text
    Generic,
}

impl ControlKind {
    /// Classify an element by tag
    pub fn of<D: Document + ?Sized>(doc: &D, el: NodeId) -> Self {
        match doc.tag_name(el) {
            Some("input" | "textarea") => Self::TextEntry,
            Some("select") => Self::Selection,
            _ => Self::Generic,
        }
    }

    /// Read the element's current value
    pub fn read<D: Document + ?Sized>(self, doc: &D, el: NodeId) -> ResolvedValue {
        match self {
            Self::TextEntry => ResolvedValue::text(doc.control_value(el)),
            Self::Selection => {
                let options = doc.options(el);
                match doc.selected_index(el).and_then(|i| options.get(i)) {
                    Some(option) => ResolvedValue::selection(&option.value, &option.text),
                    None => ResolvedValue::selection("", ""),
                }
            }
            Self::Generic => ResolvedValue::text(doc.text_content(el)),
        }
    }

    /// Write a value; returns whether the element changed
    pub fn write<D: Document + ?Sized>(self, doc: &mut D, el: NodeId, value: &ResolvedValue) -> bool {
        let target = value.primary();
        let changed = match self {
            Self::TextEntry => {
                if doc.control_value(el) == target {
                    false
                } else {
                    doc.set_control_value(el, target);
                    true
                }
            }
            Self::Selection => write_selection(doc, el, target),
            Self::Generic => {
                if doc.text_content(el) == target {
                    false
                } else {
                    doc.set_text_content(el, target);
                    true
                }
            }
        };
        if changed {
            doc.dispatch(el, ControlEvent::Input);
            doc.dispatch(el, ControlEvent::Change);
        }
        changed
    }
}

/// Assign by option value, falling back to option label; no match clears the selection.
fn write_selection<D: Document + ?Sized>(doc: &mut D, el: NodeId, target: &str) -> bool {
    let options = doc.options(el);
    let current = doc.selected_index(el);
    if current
        .and_then(|i| options.get(i))
        .is_some_and(|option| option.value == target)
    {
        return false;
    }
    let next = options
        .iter()
        .position(|option| option.value == target)
        .or_else(|| options.iter().position(|option| option.text == target));
    if next == current {
        return false;
    }
    doc.set_selected_index(el, next);
    true
}

/// Read an element's value
pub fn read<D: Document + ?Sized>(doc: &D, el: NodeId) -> ResolvedValue {
    ControlKind::of(doc, el).read(doc, el)
}

/// Write an element's value, dispatching `input` and `change` when it changed
pub fn write<D: Document + ?Sized>(doc: &mut D, el: NodeId, value: &ResolvedValue) -> bool {
    let kind = ControlKind::of(doc, el);
    let changed = kind.write(doc, el, value);
    tracing::trace!(element = %el, ?kind, changed, "write");
    changed
}
