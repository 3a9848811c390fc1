//! Condition operators and their comparison semantics.

use crate::value::ResolvedValue;
use serde::{Deserialize, Serialize};

/// Comparison operator of a condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    /// Trimmed, case-sensitive equality
    #[default]
    Equals,
    /// Negated equality
    NotEquals,
    /// Trimmed substring test
    Contains,
}

impl Operator {
    /// Wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
        }
    }

    fn check(self, actual: &str, target: &str) -> bool {
        let actual = actual.trim();
        match self {
            Self::Equals => actual == target,
            Self::NotEquals => actual != target,
            Self::Contains => actual.contains(target),
        }
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Evaluate `actual <operator> target`.
///
/// Both sides are trimmed. A selection value is checked component-wise:
/// `Equals` and `Contains` hold when either the value or the label satisfies
/// them, while `NotEquals` holds only when both differ, so a selection whose
/// label equals the target is never "not equal" to it.
pub fn compare(actual: &ResolvedValue, operator: Operator, target: &str) -> bool {
    let target = target.trim();
    match actual {
        ResolvedValue::Text(value) => operator.check(value, target),
        ResolvedValue::Selection { value, text } => {
            let by_value = operator.check(value, target);
            let by_text = operator.check(text, target);
            match operator {
                Operator::NotEquals => by_value && by_text,
                Operator::Equals | Operator::Contains => by_value || by_text,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Plain values
    // =========================================================================

    mod plain_tests {
        use super::*;

        #[test]
        fn test_equals_trims_both_sides() {
            assert!(compare(&" US ".into(), Operator::Equals, "US\n"));
        }

        #[test]
        fn test_equals_is_case_sensitive() {
            assert!(!compare(&"us".into(), Operator::Equals, "US"));
            assert!(compare(&"us".into(), Operator::NotEquals, "US"));
        }

        #[test]
        fn test_contains_is_substring() {
            assert!(compare(&"Express shipping".into(), Operator::Contains, "ship"));
            assert!(!compare(&"Express".into(), Operator::Contains, "ship"));
            assert!(compare(&"anything".into(), Operator::Contains, "  "));
        }

        #[test]
        fn test_empty_values() {
            assert!(compare(&"".into(), Operator::Equals, ""));
            assert!(compare(&"   ".into(), Operator::Equals, ""));
            assert!(!compare(&"".into(), Operator::NotEquals, " "));
        }
    }

    // =========================================================================
    // Selection values
    // =========================================================================

    mod selection_tests {
        use super::*;

        fn selection() -> ResolvedValue {
            ResolvedValue::selection("v1", "Label A")
        }

        #[test]
        fn test_equals_matches_either_component() {
            assert!(compare(&selection(), Operator::Equals, "v1"));
            assert!(compare(&selection(), Operator::Equals, "Label A"));
            assert!(!compare(&selection(), Operator::Equals, "v2"));
        }

        #[test]
        fn test_not_equals_requires_both_components_to_differ() {
            assert!(!compare(&selection(), Operator::NotEquals, "Label A"));
            assert!(!compare(&selection(), Operator::NotEquals, "v1"));
            assert!(compare(&selection(), Operator::NotEquals, "Label B"));
        }

        #[test]
        fn test_contains_matches_either_component() {
            assert!(compare(&selection(), Operator::Contains, "Lab"));
            assert!(compare(&selection(), Operator::Contains, "1"));
            assert!(!compare(&selection(), Operator::Contains, "zz"));
        }
    }

    #[test]
    fn test_operator_wire_names() {
        assert_eq!(Operator::NotEquals.to_string(), "not_equals");
        let parsed: Operator = serde_json::from_str("\"contains\"").unwrap_or_default();
        assert_eq!(parsed, Operator::Contains);
    }
}
