//! Element picker support: turn a chosen element into a locator.

use crate::dom::{Document, NodeId};
use crate::locator::Locator;
use serde::{Deserialize, Serialize};

/// Selectors shorter than this are prefixed with their parent's selector
const MIN_SELECTOR_LEN: usize = 5;

/// Locator captured for a picked element plus a preview of its text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PickerResult {
    /// Inferred locator
    pub locator: Locator,
    /// Leading characters of the element's rendered text
    pub sample_text: String,
}

/// Infer a locator: `id` if present, then `name`, then a generated selector
pub fn infer_locator<D: Document + ?Sized>(doc: &D, el: NodeId) -> Locator {
    let non_empty = |name| doc.attribute(el, name).filter(|value| !value.is_empty());
    if let Some(id) = non_empty("id") {
        return Locator::id(id);
    }
    if let Some(name) = non_empty("name") {
        return Locator::name(name);
    }
    Locator::selector(generate_selector(doc, el))
}

/// Build a `tag#id.class` selector, walking up through parents while it is too short to be distinctive.
pub fn generate_selector<D: Document + ?Sized>(doc: &D, el: NodeId) -> String {
    let Some(tag) = doc.tag_name(el) else {
        return String::new();
    };
    if tag == "html" {
        return "HTML".to_string();
    }
    let mut selector = tag.to_string();
    if let Some(id) = doc.attribute(el, "id").filter(|id| !id.is_empty()) {
        selector.push('#');
        selector.push_str(id);
    }
    if let Some(class) = doc.attribute(el, "class") {
        for name in class.split_whitespace() {
            selector.push('.');
            selector.push_str(name);
        }
    }
    if selector.len() < MIN_SELECTOR_LEN {
        if let Some(parent) = doc.parent(el) {
            return format!("{} > {selector}", generate_selector(doc, parent));
        }
    }
    selector
}

/// Capture a picked element
pub fn pick<D: Document + ?Sized>(doc: &D, el: NodeId, sample_len: usize) -> PickerResult {
    PickerResult {
        locator: infer_locator(doc, el),
        sample_text: doc.text_content(el).chars().take(sample_len).collect(),
    }
}
