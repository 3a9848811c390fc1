//! Declarative page fixtures (YAML or JSON) used to build a [`Page`].
//!
//! ```yaml
//! url: https://shop.example.com/checkout
//! body:
//!   - tag: select
//!     id: country
//!     options:
//!       - { value: US, text: United States, selected: true }
//!       - { value: CA, text: Canada }
//!   - tag: input
//!     id: zip
//! ```
//!
//! [`Page`]: super::Page

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A whole page: its URL and the children of `<body>`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageSpec {
    /// Page URL
    #[serde(default = "blank_url")]
    pub url: String,
    /// Elements under `<body>`
    #[serde(default)]
    pub body: Vec<ElementSpec>,
}

fn blank_url() -> String {
    "about:blank".to_string()
}

impl Default for PageSpec {
    fn default() -> Self {
        Self {
            url: blank_url(),
            body: Vec::new(),
        }
    }
}

impl PageSpec {
    /// Create an empty page at `url`
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            body: Vec::new(),
        }
    }

    /// Append an element to `<body>`
    #[must_use]
    pub fn with_element(mut self, element: ElementSpec) -> Self {
        self.body.push(element);
        self
    }
}

/// One element of a fixture
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSpec {
    /// Tag name
    pub tag: String,
    /// `id` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// `name` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// `class` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// Any other attributes
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Text owned by the element
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub text: String,
    /// Initial value of a text-entry control
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Options of a `<select>`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionSpec>,
    /// Child elements
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementSpec>,
}

impl ElementSpec {
    /// Create an element with the given tag
    #[must_use]
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            ..Self::default()
        }
    }

    /// Text input with an id
    #[must_use]
    pub fn input(id: &str) -> Self {
        Self::new("input").with_id(id)
    }

    /// Select with an id and `(value, label)` options, first option selected
    #[must_use]
    pub fn select(id: &str, options: &[(&str, &str)]) -> Self {
        options
            .iter()
            .fold(Self::new("select").with_id(id), |spec, (value, text)| {
                spec.with_option(value, text)
            })
    }

    /// Sets the id
    #[must_use]
    pub fn with_id(mut self, id: &str) -> Self {
        self.id = Some(id.to_string());
        self
    }

    /// Sets the name
    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Sets the class list
    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.class = Some(class.to_string());
        self
    }

    /// Sets an attribute
    #[must_use]
    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.attributes.insert(key.to_string(), value.to_string());
        self
    }

    /// Sets the own text
    #[must_use]
    pub fn with_text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    /// Sets the control value
    #[must_use]
    pub fn with_value(mut self, value: &str) -> Self {
        self.value = Some(value.to_string());
        self
    }

    /// Adds an option
    #[must_use]
    pub fn with_option(mut self, value: &str, text: &str) -> Self {
        self.options.push(OptionSpec {
            value: value.to_string(),
            text: text.to_string(),
            selected: false,
        });
        self
    }

    /// Marks the option with `value` as selected
    #[must_use]
    pub fn with_selected(mut self, value: &str) -> Self {
        for option in &mut self.options {
            option.selected = option.value == value;
        }
        self
    }

    /// Adds a child element
    #[must_use]
    pub fn with_child(mut self, child: ElementSpec) -> Self {
        self.children.push(child);
        self
    }
}

/// One `<option>` of a fixture select
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSpec {
    /// Option value
    pub value: String,
    /// Option label, defaults to the value
    #[serde(default)]
    pub text: String,
    /// Initially selected
    #[serde(default)]
    pub selected: bool,
}
