//! Run coordinator: owns the page, the site's rules and the scheduler.
//!
//! An [`Engine`] is the single owner of everything a page-resident rule
//! session needs. Hosts drive it through three kinds of entry point:
//!
//! - [`Engine::handle`] for typed [`Command`]s from the rule editor,
//! - [`Engine::on_mutations`] / [`Engine::flush`] for observed DOM changes,
//! - [`Engine::tick`] from a timer, which runs the automatic pass once the
//!   debounce window has elapsed.
//!
//! Every pass reports to the collaborators exactly once: first the match
//! count to the [`MatchNotifier`], then the updated rules to the
//! [`RuleSink`]. Any collaborator failure means the hosting context is gone;
//! the engine stops observing and every later pass is a no-op.

use crate::config::EngineConfig;
use crate::dom::{Document, MutationRecord, MutationSource, NodeId};
use crate::evaluator::evaluate;
use crate::picker::{pick, PickerResult};
use crate::result::StoreError;
use crate::rule::Rule;
use crate::scheduler::ChangeScheduler;
use std::time::Instant;

/// Loads the rule set of a site
pub trait RuleSource {
    /// Rules stored for `site`, or `None` when the site has no entry.
    ///
    /// A stored empty list is `Some(vec![])`: the site had rules and all of
    /// them were deleted.
    fn load_rules(&mut self, site: &str) -> Result<Option<Vec<Rule>>, StoreError>;
}

/// Persists the rule set of a site
pub trait RuleSink {
    /// Replace the rules stored for `site`
    fn save_rules(&mut self, site: &str, rules: &[Rule]) -> Result<(), StoreError>;
}

/// Receives the per-pass match count (the toolbar badge)
pub trait MatchNotifier {
    /// Report how many rules matched in the last pass
    fn notify(&mut self, count: usize) -> Result<(), StoreError>;
}

/// Requests from the rule editor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Reload the site's rules and start monitoring when the site has an entry
    ReloadRules,
    /// Run every enabled rule, manual ones included
    RunAll,
    /// Evaluate one rule as supplied, without persisting it
    RunOne(Rule),
    /// Enter element picking mode
    StartPicker,
    /// The user chose an element while picking
    PickElement(NodeId),
}

/// Responses to [`Command`]s
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Number of rules loaded
    Reloaded(usize),
    /// Number of rules that matched
    Count(usize),
    /// Whether the supplied rule matched
    Matched(bool),
    /// Picking mode entered
    PickerStarted,
    /// Locator captured for the chosen element
    Picked(PickerResult),
    /// The command did not apply in the current state
    Ignored,
}

/// Page-resident rule engine
#[derive(Debug)]
pub struct Engine<D, S, N> {
    doc: D,
    store: S,
    notifier: N,
    site: String,
    config: EngineConfig,
    rules: Vec<Rule>,
    scheduler: ChangeScheduler,
    monitoring: bool,
    picking: bool,
}

impl<D, S, N> Engine<D, S, N>
where
    D: Document,
    S: RuleSource + RuleSink,
    N: MatchNotifier,
{
    /// Create an engine for `site`; no rules are loaded until [`Engine::reload_rules`]
    pub fn new(doc: D, store: S, notifier: N, site: impl Into<String>, config: EngineConfig) -> Self {
        Self {
            scheduler: ChangeScheduler::from_config(&config),
            doc,
            store,
            notifier,
            site: site.into(),
            config,
            rules: Vec::new(),
            monitoring: false,
            picking: false,
        }
    }

    /// Replace the loaded rules with the site's stored ones, without running a pass.
    ///
    /// Returns `None` when the site has no stored entry (the loaded rules are
    /// kept) or when the context is invalidated.
    pub fn load_rules(&mut self) -> Option<usize> {
        if self.is_invalidated() {
            return None;
        }
        match self.store.load_rules(&self.site) {
            Ok(Some(rules)) => self.rules = rules,
            Ok(None) => {
                tracing::debug!(site = %self.site, "no stored rules");
                return None;
            }
            Err(err) => {
                self.invalidate(&err);
                return None;
            }
        }
        tracing::debug!(site = %self.site, loaded = self.rules.len(), "rules loaded");
        Some(self.rules.len())
    }

    /// Load the site's rules; when the site has an entry, run an automatic pass and start monitoring.
    ///
    /// An empty entry still runs the pass, so the reported count drops to 0.
    /// Returns the number of rules loaded.
    pub fn reload_rules(&mut self) -> usize {
        let Some(loaded) = self.load_rules() else {
            return 0;
        };
        self.run_all(false);
        self.monitoring = !self.is_invalidated();
        loaded
    }

    /// Run one pass over the loaded rules; returns how many matched.
    ///
    /// Disabled rules never run. Manual rules run only when `force_manual`.
    pub fn run_all(&mut self, force_manual: bool) -> usize {
        if self.is_invalidated() {
            return 0;
        }
        let mut evaluated = 0;
        let mut matched = 0;
        for rule in self.rules.iter_mut().filter(|rule| rule.runs_in_pass(force_manual)) {
            evaluated += 1;
            if evaluate(&mut self.doc, rule) {
                matched += 1;
            }
        }
        tracing::info!(site = %self.site, evaluated, matched, force_manual, "pass complete");
        self.report(matched);
        matched
    }

    /// Evaluate a single rule as supplied, regardless of its enabled flag and mode.
    ///
    /// Nothing is persisted.
    pub fn run_one(&mut self, mut rule: Rule) -> bool {
        if self.is_invalidated() {
            return false;
        }
        evaluate(&mut self.doc, &mut rule)
    }

    /// Feed observed mutation records; returns whether a pass was scheduled
    pub fn on_mutations(&mut self, records: &[MutationRecord], now: Instant) -> bool {
        if !self.monitoring {
            return false;
        }
        self.scheduler.observe(records, now)
    }

    /// Run the automatic pass if the debounce deadline has been reached
    pub fn tick(&mut self, now: Instant) -> Option<usize> {
        if self.scheduler.poll(now) {
            Some(self.run_all(false))
        } else {
            None
        }
    }

    /// Handle a command from the rule editor
    pub fn handle(&mut self, command: Command) -> Reply {
        match command {
            Command::ReloadRules => Reply::Reloaded(self.reload_rules()),
            Command::RunAll => Reply::Count(self.run_all(true)),
            Command::RunOne(rule) => Reply::Matched(self.run_one(rule)),
            Command::StartPicker | Command::PickElement(_) if self.is_invalidated() => {
                Reply::Ignored
            }
            Command::StartPicker => {
                self.picking = true;
                Reply::PickerStarted
            }
            Command::PickElement(el) if self.picking && self.doc.tag_name(el).is_some() => {
                self.picking = false;
                let result = pick(&self.doc, el, self.config.sample_text_len);
                tracing::debug!(locator = %result.locator, "element picked");
                Reply::Picked(result)
            }
            Command::PickElement(_) => Reply::Ignored,
        }
    }

    fn report(&mut self, matched: usize) {
        let delivered = self
            .notifier
            .notify(matched)
            .and_then(|()| self.store.save_rules(&self.site, &self.rules));
        if let Err(err) = delivered {
            self.invalidate(&err);
        }
    }

    fn invalidate(&mut self, cause: &StoreError) {
        tracing::warn!(site = %self.site, error = %cause, "context invalidated, observation stopped");
        self.scheduler.invalidate();
        self.monitoring = false;
        self.picking = false;
    }

    /// Whether the hosting context has been lost
    #[must_use]
    pub const fn is_invalidated(&self) -> bool {
        self.scheduler.is_terminated()
    }

    /// Whether mutations currently schedule passes
    #[must_use]
    pub const fn is_monitoring(&self) -> bool {
        self.monitoring
    }

    /// Whether picking mode is active
    #[must_use]
    pub const fn is_picking(&self) -> bool {
        self.picking
    }

    /// Loaded rules with their latest match state
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Site key the rules belong to
    #[must_use]
    pub fn site(&self) -> &str {
        &self.site
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Change scheduler
    #[must_use]
    pub const fn scheduler(&self) -> &ChangeScheduler {
        &self.scheduler
    }

    /// The page
    #[must_use]
    pub const fn document(&self) -> &D {
        &self.doc
    }

    /// The page, mutably (page scripts and user input)
    pub fn document_mut(&mut self) -> &mut D {
        &mut self.doc
    }

    /// Rule store
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Rule store, mutably
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Match notifier
    #[must_use]
    pub const fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Match notifier, mutably
    pub fn notifier_mut(&mut self) -> &mut N {
        &mut self.notifier
    }
}

impl<D, S, N> Engine<D, S, N>
where
    D: Document + MutationSource,
    S: RuleSource + RuleSink,
    N: MatchNotifier,
{
    /// Drain the page's own mutation records into the scheduler
    pub fn flush(&mut self, now: Instant) -> bool {
        let records = self.doc.take_mutations();
        self.on_mutations(&records, now)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::dom::{ControlEvent, ElementSpec, Page, PageSpec};
    use crate::locator::Locator;
    use crate::rule::{Action, Condition};
    use crate::store::{MemoryStore, RecordingNotifier};
    use std::time::Duration;

    const SITE: &str = "shop.example.com";

    fn page() -> Page {
        Page::from_spec(
            &PageSpec::new("https://shop.example.com/checkout")
                .with_element(
                    ElementSpec::select("country", &[("US", "United States"), ("CA", "Canada")])
                        .with_selected("US"),
                )
                .with_element(ElementSpec::input("zip"))
                .with_element(ElementSpec::new("span").with_id("banner").with_text("")),
        )
        .unwrap()
    }

    fn canada_rule() -> Rule {
        Rule::new("Canada zip")
            .with_condition(Condition::equals(Locator::id("country"), "CA"))
            .with_action(Action::set(Locator::id("zip"), "K1A 0B1"))
    }

    fn engine(rules: Vec<Rule>) -> Engine<Page, MemoryStore, RecordingNotifier> {
        let store = MemoryStore::new().with_site(SITE, rules);
        Engine::new(page(), store, RecordingNotifier::new(), SITE, EngineConfig::default())
    }

    fn zip(engine: &Engine<Page, MemoryStore, RecordingNotifier>) -> String {
        let doc = engine.document();
        doc.control_value(doc.element_by_id("zip").unwrap()).to_string()
    }

    // =========================================================================
    // Passes
    // =========================================================================

    mod pass_tests {
        use super::*;

        #[test]
        fn test_reload_runs_pass_and_starts_monitoring() {
            let mut engine = engine(vec![Rule::new("always")]);
            assert_eq!(engine.handle(Command::ReloadRules), Reply::Reloaded(1));
            assert!(engine.is_monitoring());
            assert_eq!(engine.notifier().counts(), &[1]);
            assert_eq!(engine.store().save_count(), 1);
            assert!(engine.store().rules_for(SITE)[0].last_matched);
        }

        #[test]
        fn test_load_rules_runs_nothing() {
            let mut engine = engine(vec![Rule::new("always")]);
            assert_eq!(engine.load_rules(), Some(1));
            assert!(!engine.is_monitoring());
            assert!(engine.notifier().counts().is_empty());
            assert_eq!(engine.run_all(false), 1);
        }

        #[test]
        fn test_reload_without_entry_stays_idle() {
            let mut engine = Engine::new(
                page(),
                MemoryStore::new(),
                RecordingNotifier::new(),
                SITE,
                EngineConfig::default(),
            );
            assert_eq!(engine.load_rules(), None);
            assert_eq!(engine.reload_rules(), 0);
            assert!(!engine.is_monitoring());
            assert!(engine.notifier().counts().is_empty());
            assert_eq!(engine.store().save_count(), 0);
        }

        #[test]
        fn test_reload_empty_entry_runs_pass() {
            let mut engine = engine(Vec::new());
            assert_eq!(engine.load_rules(), Some(0));
            assert_eq!(engine.reload_rules(), 0);
            assert!(engine.is_monitoring());
            assert_eq!(engine.notifier().counts(), &[0]);
        }

        #[test]
        fn test_reload_after_rules_deleted_reports_zero() {
            let mut engine = engine(vec![Rule::new("always")]);
            assert_eq!(engine.handle(Command::ReloadRules), Reply::Reloaded(1));
            engine.store_mut().save_rules(SITE, &[]).unwrap();

            assert_eq!(engine.handle(Command::ReloadRules), Reply::Reloaded(0));
            assert_eq!(engine.notifier().counts(), &[1, 0]);
            assert!(engine.rules().is_empty());
        }

        #[test]
        fn test_disabled_and_manual_rules() {
            let mut engine = engine(vec![
                Rule::new("off").disabled(),
                Rule::new("manual").manual(),
                Rule::new("auto"),
            ]);
            engine.reload_rules();
            assert_eq!(engine.notifier().last(), Some(1));
            assert!(!engine.rules()[1].last_matched);
            assert_eq!(engine.handle(Command::RunAll), Reply::Count(2));
            assert!(engine.rules()[1].last_matched);
            assert!(!engine.rules()[0].last_matched);
        }

        #[test]
        fn test_run_one_ignores_flags_and_does_not_persist() {
            let mut engine = engine(Vec::new());
            let rule = Rule::new("one-off")
                .disabled()
                .manual()
                .with_action(Action::set(Locator::id("zip"), "90210"));
            assert_eq!(engine.handle(Command::RunOne(rule)), Reply::Matched(true));
            assert_eq!(zip(&engine), "90210");
            assert_eq!(engine.store().save_count(), 0);
            assert!(engine.notifier().counts().is_empty());
        }
    }

    // =========================================================================
    // Mutation-driven passes
    // =========================================================================

    mod monitor_tests {
        use super::*;

        #[test]
        fn test_user_change_triggers_debounced_pass() {
            let start = Instant::now();
            let mut engine = engine(vec![canada_rule()]);
            engine.reload_rules();
            assert_eq!(zip(&engine), "");

            let doc = engine.document_mut();
            let country = doc.element_by_id("country").unwrap();
            doc.set_selected_index(country, Some(1));
            doc.set_attribute(country, "data-touched", "1");
            assert!(engine.flush(start));

            assert_eq!(engine.tick(start + Duration::from_millis(499)), None);
            assert_eq!(engine.tick(start + Duration::from_millis(500)), Some(1));
            assert_eq!(zip(&engine), "K1A 0B1");
        }

        #[test]
        fn test_mutations_ignored_before_monitoring() {
            let mut engine = engine(Vec::new());
            let body = engine.document().body();
            engine.document_mut().set_attribute(body, "class", "x");
            assert!(!engine.flush(Instant::now()));
        }

        #[test]
        fn test_own_generic_writes_converge() {
            let start = Instant::now();
            let rule = Rule::new("banner").with_action(Action::set(Locator::id("banner"), "Hi"));
            let mut engine = engine(vec![rule]);
            engine.reload_rules();
            // the text write is itself a mutation
            assert!(engine.flush(start));
            let later = start + Duration::from_millis(500);
            assert_eq!(engine.tick(later), Some(1));
            // the second pass wrote nothing, so nothing new is observed
            assert!(!engine.flush(later));
            assert_eq!(engine.tick(later + Duration::from_secs(5)), None);
        }
    }

    // =========================================================================
    // Invalidation
    // =========================================================================

    mod invalidate_tests {
        use super::*;

        #[test]
        fn test_notifier_failure_invalidates() {
            let start = Instant::now();
            let mut engine = engine(vec![canada_rule()]);
            engine.notifier_mut().fail_with(StoreError::ContextInvalidated);
            engine.reload_rules();
            assert!(engine.is_invalidated());
            assert!(!engine.is_monitoring());
            assert_eq!(engine.store().save_count(), 0);

            let doc = engine.document_mut();
            let country = doc.element_by_id("country").unwrap();
            doc.set_attribute(country, "data-x", "1");
            assert!(!engine.flush(start));
            assert_eq!(engine.tick(start + Duration::from_secs(1)), None);
            assert_eq!(engine.run_all(true), 0);
        }

        #[test]
        fn test_store_failure_invalidates() {
            let mut engine = engine(vec![Rule::new("a")]);
            engine.store_mut().invalidate();
            assert_eq!(engine.reload_rules(), 0);
            assert!(engine.is_invalidated());
        }

        #[test]
        fn test_invalidated_drops_pending_pass() {
            let start = Instant::now();
            let mut engine = engine(vec![canada_rule()]);
            engine.reload_rules();
            let body = engine.document().body();
            engine.document_mut().set_attribute(body, "class", "busy");
            assert!(engine.flush(start));
            engine.store_mut().invalidate();
            // the pending pass runs, its save fails, and nothing fires afterwards
            assert_eq!(engine.tick(start + Duration::from_millis(500)), Some(0));
            assert!(engine.is_invalidated());
            assert_eq!(engine.handle(Command::RunAll), Reply::Count(0));
        }

        #[test]
        fn test_invalidated_ignores_picker() {
            let mut engine = engine(vec![Rule::new("a")]);
            engine.store_mut().invalidate();
            engine.reload_rules();
            assert!(engine.is_invalidated());

            let zip = engine.document().element_by_id("zip").unwrap();
            assert_eq!(engine.handle(Command::StartPicker), Reply::Ignored);
            assert!(!engine.is_picking());
            assert_eq!(engine.handle(Command::PickElement(zip)), Reply::Ignored);
        }

        #[test]
        fn test_invalidation_leaves_picker_mode() {
            let mut engine = engine(vec![Rule::new("a")]);
            assert_eq!(engine.handle(Command::StartPicker), Reply::PickerStarted);
            engine.notifier_mut().fail_with(StoreError::ContextInvalidated);
            engine.run_all(true);

            let zip = engine.document().element_by_id("zip").unwrap();
            assert!(!engine.is_picking());
            assert_eq!(engine.handle(Command::PickElement(zip)), Reply::Ignored);
        }
    }

    // =========================================================================
    // Picker
    // =========================================================================

    mod picker_tests {
        use super::*;

        #[test]
        fn test_pick_requires_picker_mode() {
            let mut engine = engine(Vec::new());
            let zip = engine.document().element_by_id("zip").unwrap();
            assert_eq!(engine.handle(Command::PickElement(zip)), Reply::Ignored);
            assert_eq!(engine.handle(Command::StartPicker), Reply::PickerStarted);
            match engine.handle(Command::PickElement(zip)) {
                Reply::Picked(result) => assert_eq!(result.locator, Locator::id("zip")),
                other => panic!("unexpected reply {other:?}"),
            }
            assert!(!engine.is_picking());
        }

        #[test]
        fn test_pick_unknown_node_is_ignored() {
            let mut engine = engine(Vec::new());
            engine.handle(Command::StartPicker);
            assert_eq!(engine.handle(Command::PickElement(NodeId(999))), Reply::Ignored);
            assert!(engine.is_picking());
        }

        #[test]
        fn test_pick_does_not_touch_page() {
            let mut engine = engine(Vec::new());
            engine.handle(Command::StartPicker);
            let zip = engine.document().element_by_id("zip").unwrap();
            engine.handle(Command::PickElement(zip));
            assert_eq!(engine.document().event_count(zip, ControlEvent::Change), 0);
        }
    }
}
