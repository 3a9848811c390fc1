//! In-memory page model.
//!
//! Elements live in an arena indexed by [`NodeId`]. Writes that a browser
//! would report to a mutation observer (child-list, attribute and
//! character-data changes) queue a [`MutationRecord`]; property writes such
//! as a control's value or a select's index do not, matching real DOM
//! behavior. Dispatched synthetic events are kept in a log so callers can
//! assert on them.

use super::fixture::{ElementSpec, PageSpec};
use super::{
    ControlEvent, Document, MutationKind, MutationRecord, MutationSource, NodeId, SelectOption,
};
use crate::result::{FormpilotError, FormpilotResult};
use std::collections::BTreeMap;

#[derive(Debug, Clone)]
struct Node {
    tag: String,
    attributes: BTreeMap<String, String>,
    text: String,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    value: String,
    selected: Option<usize>,
}

impl Node {
    fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_ascii_lowercase(),
            attributes: BTreeMap::new(),
            text: String::new(),
            children: Vec::new(),
            parent: None,
            value: String::new(),
            selected: None,
        }
    }
}

/// A synthetic event fired on an element
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchedEvent {
    /// Element the event was fired on
    pub target: NodeId,
    /// Event type
    pub event: ControlEvent,
    /// Whether the event bubbles
    pub bubbles: bool,
}

/// In-memory [`Document`] implementation
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    nodes: Vec<Node>,
    body: NodeId,
    mutations: Vec<MutationRecord>,
    events: Vec<DispatchedEvent>,
}

const HTML: NodeId = NodeId(0);

impl Page {
    /// Create an empty page (`<html><body></body></html>`)
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let mut html = Node::new("html");
        html.children.push(NodeId(1));
        let mut body = Node::new("body");
        body.parent = Some(HTML);
        Self {
            url: url.into(),
            nodes: vec![html, body],
            body: NodeId(1),
            mutations: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Build a page from a fixture
    pub fn from_spec(spec: &PageSpec) -> FormpilotResult<Self> {
        let mut page = Self::new(spec.url.clone());
        let body = page.body;
        for element in &spec.body {
            page.build(body, element)?;
        }
        // building is not observable
        page.mutations.clear();
        Ok(page)
    }

    /// Build a page from a YAML fixture
    pub fn from_yaml(source: &str) -> FormpilotResult<Self> {
        let spec: PageSpec = serde_yaml_ng::from_str(source)?;
        Self::from_spec(&spec)
    }

    /// Build a page from a JSON fixture
    pub fn from_json(source: &str) -> FormpilotResult<Self> {
        let spec: PageSpec = serde_json::from_str(source)?;
        Self::from_spec(&spec)
    }

    /// Page URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The `<body>` element
    #[must_use]
    pub const fn body(&self) -> NodeId {
        self.body
    }

    /// Append a new element tree under `parent`, recording a child-list mutation
    pub fn append(&mut self, parent: NodeId, spec: &ElementSpec) -> FormpilotResult<NodeId> {
        if self.node(parent).is_none() {
            return Err(FormpilotError::fixture(format!("unknown parent {parent}")));
        }
        let id = self.build(parent, spec)?;
        self.record(MutationKind::ChildList, parent);
        Ok(id)
    }

    /// Detach an element from its parent, recording a child-list mutation
    pub fn remove(&mut self, el: NodeId) {
        let Some(parent) = self.node(el).and_then(|n| n.parent) else {
            return;
        };
        if let Some(node) = self.nodes.get_mut(parent.0) {
            node.children.retain(|&child| child != el);
        }
        if let Some(node) = self.nodes.get_mut(el.0) {
            node.parent = None;
        }
        self.record(MutationKind::ChildList, parent);
    }

    /// Set an attribute, recording an attribute mutation
    pub fn set_attribute(&mut self, el: NodeId, name: &str, value: &str) {
        if let Some(node) = self.nodes.get_mut(el.0) {
            node.attributes.insert(name.to_string(), value.to_string());
            self.record(MutationKind::Attributes, el);
        }
    }

    /// Edit the element's own text in place, recording a character-data mutation
    pub fn edit_text(&mut self, el: NodeId, text: &str) {
        if let Some(node) = self.nodes.get_mut(el.0) {
            node.text = text.to_string();
            self.record(MutationKind::CharacterData, el);
        }
    }

    /// Synthetic events fired so far
    #[must_use]
    pub fn events(&self) -> &[DispatchedEvent] {
        &self.events
    }

    /// Number of `event`s fired on `el`
    #[must_use]
    pub fn event_count(&self, el: NodeId, event: ControlEvent) -> usize {
        self.events
            .iter()
            .filter(|e| e.target == el && e.event == event)
            .count()
    }

    /// Forget the event log
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Pending mutation records, without draining them
    #[must_use]
    pub fn pending_mutations(&self) -> &[MutationRecord] {
        &self.mutations
    }

    fn node(&self, el: NodeId) -> Option<&Node> {
        self.nodes.get(el.0)
    }

    fn record(&mut self, kind: MutationKind, target: NodeId) {
        self.mutations.push(MutationRecord::new(kind, target));
    }

    fn build(&mut self, parent: NodeId, spec: &ElementSpec) -> FormpilotResult<NodeId> {
        let tag = spec.tag.trim();
        if tag.is_empty() || !tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(FormpilotError::fixture(format!(
                "invalid tag name {:?}",
                spec.tag
            )));
        }
        let mut node = Node::new(tag);
        if !spec.options.is_empty() && node.tag != "select" {
            return Err(FormpilotError::fixture(format!(
                "options are only allowed on select, found <{}>",
                node.tag
            )));
        }
        node.attributes.clone_from(&spec.attributes);
        for (key, value) in [("id", &spec.id), ("name", &spec.name), ("class", &spec.class)] {
            if let Some(value) = value {
                node.attributes.insert(key.to_string(), value.clone());
            }
        }
        node.text.clone_from(&spec.text);
        node.value = spec
            .value
            .clone()
            .or_else(|| spec.attributes.get("value").cloned())
            .unwrap_or_default();
        node.parent = Some(parent);

        let id = NodeId(self.nodes.len());
        self.nodes.push(node);
        self.nodes[parent.0].children.push(id);

        let mut selected = None;
        for (index, option) in spec.options.iter().enumerate() {
            let label = if option.text.is_empty() {
                &option.value
            } else {
                &option.text
            };
            let child = ElementSpec::new("option")
                .with_attr("value", &option.value)
                .with_text(label);
            self.build(id, &child)?;
            if option.selected && selected.is_none() {
                selected = Some(index);
            }
        }
        if !spec.options.is_empty() {
            self.nodes[id.0].selected = selected.or(Some(0));
        }

        for child in &spec.children {
            self.build(id, child)?;
        }
        Ok(id)
    }

    fn option_children(&self, el: NodeId) -> Vec<NodeId> {
        self.node(el)
            .map(|node| {
                node.children
                    .iter()
                    .copied()
                    .filter(|&child| self.tag_name(child) == Some("option"))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn collect(&self, el: NodeId, out: &mut Vec<NodeId>) {
        out.push(el);
        if let Some(node) = self.node(el) {
            for &child in &node.children {
                self.collect(child, out);
            }
        }
    }
}

impl Document for Page {
    fn elements(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        self.collect(HTML, &mut out);
        out
    }

    fn tag_name(&self, el: NodeId) -> Option<&str> {
        self.node(el).map(|node| node.tag.as_str())
    }

    fn attribute(&self, el: NodeId, name: &str) -> Option<&str> {
        self.node(el)
            .and_then(|node| node.attributes.get(name))
            .map(String::as_str)
    }

    fn parent(&self, el: NodeId) -> Option<NodeId> {
        self.node(el).and_then(|node| node.parent)
    }

    fn own_text(&self, el: NodeId) -> &str {
        self.node(el).map_or("", |node| node.text.as_str())
    }

    fn text_content(&self, el: NodeId) -> String {
        let Some(node) = self.node(el) else {
            return String::new();
        };
        let mut text = node.text.clone();
        for &child in &node.children {
            text.push_str(&self.text_content(child));
        }
        text
    }

    fn set_text_content(&mut self, el: NodeId, text: &str) {
        let Some(node) = self.nodes.get_mut(el.0) else {
            return;
        };
        let children = std::mem::take(&mut node.children);
        node.text = text.to_string();
        for child in children {
            if let Some(orphan) = self.nodes.get_mut(child.0) {
                orphan.parent = None;
            }
        }
        self.record(MutationKind::ChildList, el);
    }

    fn control_value(&self, el: NodeId) -> &str {
        self.node(el).map_or("", |node| node.value.as_str())
    }

    fn set_control_value(&mut self, el: NodeId, value: &str) {
        if let Some(node) = self.nodes.get_mut(el.0) {
            node.value = value.to_string();
        }
    }

    fn options(&self, el: NodeId) -> Vec<SelectOption> {
        self.option_children(el)
            .into_iter()
            .map(|option| {
                SelectOption::new(
                    self.attribute(option, "value").unwrap_or_default(),
                    self.text_content(option),
                )
            })
            .collect()
    }

    fn selected_index(&self, el: NodeId) -> Option<usize> {
        self.node(el).and_then(|node| node.selected)
    }

    fn set_selected_index(&mut self, el: NodeId, index: Option<usize>) {
        let count = self.option_children(el).len();
        if let Some(node) = self.nodes.get_mut(el.0) {
            node.selected = index.filter(|&i| i < count);
        }
    }

    fn dispatch(&mut self, el: NodeId, event: ControlEvent) {
        self.events.push(DispatchedEvent {
            target: el,
            event,
            bubbles: true,
        });
    }
}

impl MutationSource for Page {
    fn take_mutations(&mut self) -> Vec<MutationRecord> {
        std::mem::take(&mut self.mutations)
    }
}
