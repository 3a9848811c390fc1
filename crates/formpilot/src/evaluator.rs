//! Rule evaluation: AND across conditions, then actions in order.

use crate::compare::compare;
use crate::dom::Document;
use crate::locator::resolve;
use crate::rule::{Condition, Rule, ValueSource};
use crate::value::{self, ResolvedValue};
use serde::{Deserialize, Serialize};

/// What happened when a rule was evaluated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleOutcome {
    /// Every condition held
    pub matched: bool,
    /// Index of the first condition that failed
    pub failed_condition: Option<usize>,
    /// Actions that changed their element
    pub written: usize,
    /// Actions whose element already held the value
    pub unchanged: usize,
    /// Actions whose locator did not resolve
    pub skipped: usize,
}

/// Resolve a comparison target or action value at evaluation time.
///
/// A control reference reads the referenced element; a selection control
/// contributes only its option value. A reference that does not resolve
/// yields the empty string.
pub fn resolve_source<D: Document + ?Sized>(doc: &D, source: &ValueSource) -> String {
    match source {
        ValueSource::Static(value) => value.clone(),
        ValueSource::Control(locator) => resolve(doc, locator)
            .map(|el| value::read(doc, el).primary().to_string())
            .unwrap_or_default(),
    }
}

fn condition_holds<D: Document + ?Sized>(doc: &D, condition: &Condition) -> bool {
    let Some(el) = resolve(doc, &condition.locator) else {
        return false;
    };
    let actual = value::read(doc, el);
    let target = resolve_source(doc, &condition.target);
    compare(&actual, condition.operator, &target)
}

/// Evaluate a rule, applying its actions when it matches.
///
/// Records the outcome in `rule.last_matched` and returns it.
pub fn evaluate<D: Document + ?Sized>(doc: &mut D, rule: &mut Rule) -> bool {
    evaluate_detailed(doc, rule).matched
}

/// Evaluate a rule and report per-action results
pub fn evaluate_detailed<D: Document + ?Sized>(doc: &mut D, rule: &mut Rule) -> RuleOutcome {
    let mut outcome = RuleOutcome {
        failed_condition: rule
            .conditions
            .iter()
            .position(|condition| !condition_holds(&*doc, condition)),
        ..RuleOutcome::default()
    };
    outcome.matched = outcome.failed_condition.is_none();
    rule.last_matched = outcome.matched;

    if outcome.matched {
        for action in &rule.actions {
            // sources are late-bound: earlier actions are visible to later ones
            let Some(el) = resolve(&*doc, &action.locator) else {
                outcome.skipped += 1;
                continue;
            };
            let value = ResolvedValue::Text(resolve_source(&*doc, &action.value));
            if value::write(doc, el, &value) {
                outcome.written += 1;
            } else {
                outcome.unchanged += 1;
            }
        }
    }

    tracing::debug!(
        rule = %rule.name,
        matched = outcome.matched,
        failed_condition = ?outcome.failed_condition,
        written = outcome.written,
        skipped = outcome.skipped,
        "rule evaluated"
    );
    outcome
}
