//! Document abstraction the rule engine runs against.
//!
//! The engine never touches a concrete DOM. It talks to a [`Document`], which
//! exposes the handful of primitives needed to locate elements, read and
//! write control state, and dispatch synthetic events. Lookups such as
//! selector queries and text search have default implementations built on
//! [`Document::elements`], so a host only has to provide the primitives
//! (and may override the lookups with native ones).
//!
//! [`Page`] is the in-memory implementation used by tests and the CLI.

mod fixture;
mod page;
mod selector;

pub use fixture::{ElementSpec, OptionSpec, PageSpec};
pub use page::{DispatchedEvent, Page};
pub use selector::{Selector, SelectorError};

use serde::{Deserialize, Serialize};

/// Handle to an element inside a [`Document`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(pub usize);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}", self.0)
    }
}

/// Kind of DOM mutation, mirroring the observer record types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    /// Children added or removed
    ChildList,
    /// Attribute changed
    Attributes,
    /// Text data edited in place
    CharacterData,
}

/// One observed DOM mutation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationRecord {
    /// What changed
    pub kind: MutationKind,
    /// Element the change happened on
    pub target: NodeId,
}

impl MutationRecord {
    /// Create a mutation record
    #[must_use]
    pub const fn new(kind: MutationKind, target: NodeId) -> Self {
        Self { kind, target }
    }
}

/// Synthetic events fired after the engine writes a control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ControlEvent {
    /// `input` event
    Input,
    /// `change` event
    Change,
}

impl ControlEvent {
    /// DOM event type name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Input => "input",
            Self::Change => "change",
        }
    }
}

impl std::fmt::Display for ControlEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One `<option>` of a selection control
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Submitted value
    pub value: String,
    /// Display label
    pub text: String,
}

impl SelectOption {
    /// Create an option
    #[must_use]
    pub fn new(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            text: text.into(),
        }
    }
}

/// Page access used by the rule engine.
pub trait Document {
    /// All elements in document order
    fn elements(&self) -> Vec<NodeId>;

    /// Lowercase tag name, `None` for unknown handles
    fn tag_name(&self, el: NodeId) -> Option<&str>;

    /// Attribute value
    fn attribute(&self, el: NodeId, name: &str) -> Option<&str>;

    /// Parent element
    fn parent(&self, el: NodeId) -> Option<NodeId>;

    /// Text owned directly by the element, excluding descendants
    fn own_text(&self, el: NodeId) -> &str;

    /// Rendered text of the element and its descendants
    fn text_content(&self, el: NodeId) -> String;

    /// Replace the rendered text of the element
    fn set_text_content(&mut self, el: NodeId, text: &str);

    /// Value property of a text-entry control
    fn control_value(&self, el: NodeId) -> &str;

    /// Assign the value property of a text-entry control
    fn set_control_value(&mut self, el: NodeId, value: &str);

    /// Options of a selection control
    fn options(&self, el: NodeId) -> Vec<SelectOption>;

    /// Index of the selected option
    fn selected_index(&self, el: NodeId) -> Option<usize>;

    /// Select an option by index, or clear the selection
    fn set_selected_index(&mut self, el: NodeId, index: Option<usize>);

    /// Fire a bubbling synthetic event on the element
    fn dispatch(&mut self, el: NodeId, event: ControlEvent);

    /// Element whose `id` attribute equals `id`
    fn element_by_id(&self, id: &str) -> Option<NodeId> {
        if id.is_empty() {
            return None;
        }
        self.elements()
            .into_iter()
            .find(|&el| self.attribute(el, "id") == Some(id))
    }

    /// First element in document order matching a selector
    fn query_selector(&self, selector: &str) -> Result<Option<NodeId>, SelectorError> {
        let selector = Selector::parse(selector)?;
        Ok(self
            .elements()
            .into_iter()
            .find(|&el| selector.matches(self, el)))
    }

    /// First element in document order whose own text contains `needle`
    fn element_with_text(&self, needle: &str) -> Option<NodeId> {
        self.elements()
            .into_iter()
            .find(|&el| self.own_text(el).contains(needle))
    }
}

/// Documents that queue their own mutation records for observation
pub trait MutationSource {
    /// Drain pending mutation records
    fn take_mutations(&mut self) -> Vec<MutationRecord>;
}
