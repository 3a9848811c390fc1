//! Formpilot: per-site condition/action rules for live pages
//!
//! Formpilot watches a page's DOM, evaluates user-defined rules for the
//! page's site, and fills or syncs form controls when a rule's conditions
//! hold. Passes are debounced so that a burst of DOM changes, including the
//! engine's own writes, settles into a single evaluation.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                          Engine                                  │
//! │                                                                  │
//! │  mutations ──► ChangeScheduler ──(quiet window)──► run_all       │
//! │                                                     │            │
//! │                 ┌───────────────────────────────────┘            │
//! │                 ▼                                                │
//! │   Rule ──► evaluator ──► locator::resolve ──► value::read        │
//! │                 │                               │                │
//! │                 │                     compare ◄─┘                │
//! │                 └──(all hold)──► value::write ──► input/change   │
//! │                                                                  │
//! │  once per pass: MatchNotifier::notify, then RuleSink::save_rules │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```
//! use formpilot::prelude::*;
//!
//! let page = Page::from_spec(
//!     &PageSpec::new("https://shop.example.com/checkout")
//!         .with_element(ElementSpec::select("country", &[("US", "United States"), ("CA", "Canada")])
//!             .with_selected("CA"))
//!         .with_element(ElementSpec::input("zip")),
//! )?;
//! let rule = Rule::new("Canada zip")
//!     .with_condition(Condition::equals(Locator::id("country"), "Canada"))
//!     .with_action(Action::set(Locator::id("zip"), "K1A 0B1"));
//! let store = MemoryStore::new().with_site("shop.example.com", vec![rule]);
//!
//! let mut engine = Engine::new(page, store, RecordingNotifier::new(), "shop.example.com", EngineConfig::default());
//! assert_eq!(engine.handle(Command::ReloadRules), Reply::Reloaded(1));
//! assert_eq!(engine.notifier().last(), Some(1));
//! # Ok::<(), formpilot::FormpilotError>(())
//! ```

#![warn(missing_docs)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod compare;
pub mod config;
pub mod dom;
pub mod engine;
pub mod evaluator;
pub mod locator;
pub mod picker;
mod result;
pub mod rule;
pub mod scheduler;
pub mod store;
pub mod value;

pub use compare::{compare, Operator};
pub use config::{EngineConfig, ObserveOptions, DEFAULT_DEBOUNCE_MS, DEFAULT_SAMPLE_TEXT_LEN};
pub use dom::{Document, MutationKind, MutationRecord, MutationSource, NodeId, Page, PageSpec};
pub use engine::{Command, Engine, MatchNotifier, Reply, RuleSink, RuleSource};
pub use evaluator::{evaluate, evaluate_detailed, RuleOutcome};
pub use locator::{resolve, Locator, LocatorKind};
pub use picker::{infer_locator, PickerResult};
pub use result::{FormpilotError, FormpilotResult, StoreError};
pub use rule::{Action, Condition, Rule, TriggerMode, ValueSource};
pub use scheduler::{ChangeScheduler, SchedulerState};
pub use store::{site_key, Backup, MemoryStore, RecordingNotifier};
pub use value::{ControlKind, ResolvedValue};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::dom::{ControlEvent, ElementSpec, OptionSpec};
    pub use super::store::{
        export_backup, export_site_rules, import_backup, import_site_rules,
    };
    pub use super::{
        compare, evaluate, evaluate_detailed, infer_locator, resolve, site_key, Action,
        ChangeScheduler, Command, Condition, ControlKind, Document, Engine, EngineConfig,
        FormpilotError, FormpilotResult, Locator, LocatorKind, MatchNotifier, MemoryStore,
        MutationKind, MutationRecord, MutationSource, NodeId, ObserveOptions, Operator, Page,
        PageSpec, PickerResult, RecordingNotifier, Reply, ResolvedValue, Rule, RuleOutcome,
        RuleSink, RuleSource, StoreError, TriggerMode, ValueSource,
    };
}
