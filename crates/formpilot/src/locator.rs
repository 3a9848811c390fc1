//! Locators: strategy + value pairs that identify at most one element.
//!
//! Resolution never fails loudly. An empty value, an unset strategy, a
//! malformed selector or a plain miss all come back as `None`, so one bad
//! locator cannot abort a whole evaluation pass.

use crate::dom::{Document, NodeId, Selector};
use crate::result::FormpilotResult;
use serde::{Deserialize, Serialize};

/// How a [`Locator`] finds its element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LocatorKind {
    /// Exact `id` match
    #[serde(rename = "id")]
    ById,
    /// `name` attribute match
    #[serde(rename = "name")]
    ByName,
    /// Structural selector
    #[serde(rename = "selector")]
    BySelector,
    /// First element whose own text contains the value
    #[serde(rename = "text")]
    ByText,
    /// Strategy not chosen yet (fresh editor rows); never resolves
    #[default]
    #[serde(rename = "")]
    Unset,
}

impl LocatorKind {
    /// Wire name of the strategy
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ById => "id",
            Self::ByName => "name",
            Self::BySelector => "selector",
            Self::ByText => "text",
            Self::Unset => "",
        }
    }
}

/// A strategy + value pair identifying zero or one element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Locator {
    /// Lookup strategy
    #[serde(rename = "type", default)]
    pub kind: LocatorKind,
    /// Strategy argument
    #[serde(default)]
    pub value: String,
}

impl Locator {
    /// Create a locator
    #[must_use]
    pub fn new(kind: LocatorKind, value: impl Into<String>) -> Self {
        Self {
            kind,
            value: value.into(),
        }
    }

    /// Locate by `id`
    #[must_use]
    pub fn id(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::ById, value)
    }

    /// Locate by `name` attribute
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::ByName, value)
    }

    /// Locate by structural selector
    #[must_use]
    pub fn selector(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::BySelector, value)
    }

    /// Locate by contained text
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::new(LocatorKind::ByText, value)
    }

    /// Resolve against a document
    pub fn resolve<D: Document + ?Sized>(&self, doc: &D) -> Option<NodeId> {
        resolve(doc, self)
    }

    /// Reject a selector locator whose selector text does not parse.
    ///
    /// Resolution treats such a locator as a miss; this surfaces the mistake
    /// when a rule file is checked ahead of time.
    pub fn check(&self) -> FormpilotResult<()> {
        if self.kind == LocatorKind::BySelector && !self.value.is_empty() {
            Selector::parse(&self.value)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind.as_str(), self.value)
    }
}

/// Resolve a locator to zero or one element.
pub fn resolve<D: Document + ?Sized>(doc: &D, locator: &Locator) -> Option<NodeId> {
    if locator.value.is_empty() {
        return None;
    }
    let found = match locator.kind {
        LocatorKind::ById => doc.element_by_id(&locator.value),
        LocatorKind::ByName => query(doc, &format!("[name=\"{}\"]", locator.value)),
        LocatorKind::BySelector => query(doc, &locator.value),
        LocatorKind::ByText => doc.element_with_text(&locator.value),
        LocatorKind::Unset => None,
    };
    if found.is_none() {
        tracing::debug!(locator = %locator, "locator did not resolve");
    }
    found
}

fn query<D: Document + ?Sized>(doc: &D, selector: &str) -> Option<NodeId> {
    doc.query_selector(selector).unwrap_or_else(|err| {
        tracing::debug!(error = %err, "selector rejected");
        None
    })
}
