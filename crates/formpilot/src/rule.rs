//! Rules, conditions and actions.
//!
//! The wire format is the JSON the rule editor stores per site:
//!
//! ```json
//! {
//!   "name": "Canada shipping",
//!   "enabled": true,
//!   "triggerMode": "auto",
//!   "conditions": [{
//!     "locator": {"type": "id", "value": "country"},
//!     "operator": "equals",
//!     "targetType": "static",
//!     "targetValue": "CA"
//!   }],
//!   "actions": [{
//!     "locator": {"type": "name", "value": "shipping"},
//!     "valueType": "control",
//!     "value": {"type": "id", "value": "default-shipping"}
//!   }],
//!   "lastMatched": false
//! }
//! ```
//!
//! The `targetType`/`targetValue` and `valueType`/`value` pairs collapse into
//! a single [`ValueSource`]. A pair whose type and payload disagree does not
//! deserialize.

use crate::compare::Operator;
use crate::locator::Locator;
use serde::{Deserialize, Serialize};

/// When a rule participates in a pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerMode {
    /// Runs on every automatic pass
    #[default]
    Auto,
    /// Runs only on explicit request
    Manual,
}

/// Where a comparison target or an action value comes from
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueSource {
    /// Literal string
    Static(String),
    /// Current value of another element, read when the rule runs
    Control(Locator),
}

impl Default for ValueSource {
    fn default() -> Self {
        Self::Static(String::new())
    }
}

impl ValueSource {
    /// Literal source
    #[must_use]
    pub fn literal(value: impl Into<String>) -> Self {
        Self::Static(value.into())
    }

    /// Referenced element, for control sources
    #[must_use]
    pub const fn locator(&self) -> Option<&Locator> {
        match self {
            Self::Static(_) => None,
            Self::Control(locator) => Some(locator),
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Self::Static(_) => SOURCE_STATIC,
            Self::Control(_) => SOURCE_CONTROL,
        }
    }

    fn from_wire(kind: &str, payload: Option<RawPayload>) -> Result<Self, String> {
        match (kind, payload) {
            (SOURCE_STATIC, None) => Ok(Self::default()),
            (SOURCE_STATIC, Some(RawPayload::Text(value))) => Ok(Self::Static(value)),
            (SOURCE_STATIC, Some(RawPayload::Number(value))) => Ok(Self::Static(value.to_string())),
            (SOURCE_STATIC, Some(RawPayload::Bool(value))) => Ok(Self::Static(value.to_string())),
            (SOURCE_STATIC, Some(RawPayload::Locator(_))) => {
                Err("static value must be a string, found a locator".to_string())
            }
            (SOURCE_CONTROL, Some(RawPayload::Locator(locator))) => Ok(Self::Control(locator)),
            (SOURCE_CONTROL, _) => Err("control value must be a locator object".to_string()),
            (other, _) => Err(format!("unknown value type {other:?}")),
        }
    }

    fn to_wire(&self) -> RawPayload {
        match self {
            Self::Static(value) => RawPayload::Text(value.clone()),
            Self::Control(locator) => RawPayload::Locator(locator.clone()),
        }
    }
}

impl From<Locator> for ValueSource {
    fn from(locator: Locator) -> Self {
        Self::Control(locator)
    }
}

impl From<&str> for ValueSource {
    fn from(value: &str) -> Self {
        Self::Static(value.to_string())
    }
}

const SOURCE_STATIC: &str = "static";
const SOURCE_CONTROL: &str = "control";

fn default_source_type() -> String {
    SOURCE_STATIC.to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawPayload {
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    Locator(Locator),
}

/// A predicate over one element's current value
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawCondition", into = "RawCondition")]
pub struct Condition {
    /// Element whose value is compared
    pub locator: Locator,
    /// Comparison
    pub operator: Operator,
    /// Right-hand side
    pub target: ValueSource,
}

impl Condition {
    /// Create a condition
    #[must_use]
    pub fn new(locator: Locator, operator: Operator, target: impl Into<ValueSource>) -> Self {
        Self {
            locator,
            operator,
            target: target.into(),
        }
    }

    /// `locator equals target`
    #[must_use]
    pub fn equals(locator: Locator, target: impl Into<ValueSource>) -> Self {
        Self::new(locator, Operator::Equals, target)
    }

    /// `locator not_equals target`
    #[must_use]
    pub fn not_equals(locator: Locator, target: impl Into<ValueSource>) -> Self {
        Self::new(locator, Operator::NotEquals, target)
    }

    /// `locator contains target`
    #[must_use]
    pub fn contains(locator: Locator, target: impl Into<ValueSource>) -> Self {
        Self::new(locator, Operator::Contains, target)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCondition {
    locator: Locator,
    #[serde(default)]
    operator: Operator,
    #[serde(default = "default_source_type")]
    target_type: String,
    #[serde(default)]
    target_value: Option<RawPayload>,
}

impl TryFrom<RawCondition> for Condition {
    type Error = String;

    fn try_from(raw: RawCondition) -> Result<Self, Self::Error> {
        let target = ValueSource::from_wire(&raw.target_type, raw.target_value)
            .map_err(|message| format!("condition on {}: {message}", raw.locator))?;
        Ok(Self {
            locator: raw.locator,
            operator: raw.operator,
            target,
        })
    }
}

impl From<Condition> for RawCondition {
    fn from(condition: Condition) -> Self {
        Self {
            target_type: condition.target.type_name().to_string(),
            target_value: Some(condition.target.to_wire()),
            locator: condition.locator,
            operator: condition.operator,
        }
    }
}

/// A write applied to one element when a rule matches
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawAction", into = "RawAction")]
pub struct Action {
    /// Element to write
    pub locator: Locator,
    /// Value to write
    pub value: ValueSource,
}

impl Action {
    /// Create an action
    #[must_use]
    pub fn new(locator: Locator, value: impl Into<ValueSource>) -> Self {
        Self {
            locator,
            value: value.into(),
        }
    }

    /// Write a literal
    #[must_use]
    pub fn set(locator: Locator, value: impl Into<String>) -> Self {
        Self::new(locator, ValueSource::Static(value.into()))
    }

    /// Copy another element's value
    #[must_use]
    pub fn copy_from(locator: Locator, source: Locator) -> Self {
        Self::new(locator, ValueSource::Control(source))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    locator: Locator,
    #[serde(default = "default_source_type")]
    value_type: String,
    #[serde(default)]
    value: Option<RawPayload>,
}

impl TryFrom<RawAction> for Action {
    type Error = String;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        let value = ValueSource::from_wire(&raw.value_type, raw.value)
            .map_err(|message| format!("action on {}: {message}", raw.locator))?;
        Ok(Self {
            locator: raw.locator,
            value,
        })
    }
}

impl From<Action> for RawAction {
    fn from(action: Action) -> Self {
        Self {
            value_type: action.value.type_name().to_string(),
            value: Some(action.value.to_wire()),
            locator: action.locator,
        }
    }
}

/// A named condition/action rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Disabled rules never run in a pass
    #[serde(default)]
    pub enabled: bool,
    /// Automatic or manual
    #[serde(default)]
    pub trigger_mode: TriggerMode,
    /// All must hold for the rule to match
    pub conditions: Vec<Condition>,
    /// Applied in order when the rule matches
    pub actions: Vec<Action>,
    /// Outcome of the most recent evaluation
    #[serde(default)]
    pub last_matched: bool,
}

impl Rule {
    /// New enabled, automatic rule with no conditions or actions
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            trigger_mode: TriggerMode::Auto,
            conditions: Vec::new(),
            actions: Vec::new(),
            last_matched: false,
        }
    }

    /// Add a condition
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Add an action
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Only run on explicit request
    #[must_use]
    pub const fn manual(mut self) -> Self {
        self.trigger_mode = TriggerMode::Manual;
        self
    }

    /// Disable the rule
    #[must_use]
    pub const fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Duplicate under a `" (Copy)"` name with a cleared match state
    #[must_use]
    pub fn copy_of(&self) -> Self {
        Self {
            name: format!("{} (Copy)", self.name),
            last_matched: false,
            ..self.clone()
        }
    }

    /// Every locator the rule refers to, control references included
    pub fn locators(&self) -> impl Iterator<Item = &Locator> {
        let conditions = self.conditions.iter().flat_map(|condition| {
            std::iter::once(&condition.locator).chain(condition.target.locator())
        });
        let actions = self
            .actions
            .iter()
            .flat_map(|action| std::iter::once(&action.locator).chain(action.value.locator()));
        conditions.chain(actions)
    }

    /// Whether a pass with the given forcing runs this rule
    #[must_use]
    pub fn runs_in_pass(&self, force_manual: bool) -> bool {
        self.enabled && (force_manual || self.trigger_mode == TriggerMode::Auto)
    }
}
