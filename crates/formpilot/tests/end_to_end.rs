//! End-to-end tests: rules loaded from JSON running against YAML page fixtures

#![allow(clippy::unwrap_used, clippy::panic)]

use formpilot::prelude::*;
use std::time::{Duration, Instant};

const SITE: &str = "shop.example.com";

// ===== Fixtures =====

const CHECKOUT_PAGE: &str = r#"
url: https://shop.example.com/checkout
body:
  - tag: form
    id: checkout
    children:
      - tag: select
        id: country
        options:
          - value: US
            text: United States
          - value: CA
            text: Canada
      - tag: input
        id: zip
      - tag: input
        name: region
      - tag: div
        id: status
        text: pending
"#;

const COUNTRY_RULES: &str = r#"[
  {
    "name": "US zip",
    "enabled": true,
    "triggerMode": "auto",
    "conditions": [
      {"locator": {"type": "id", "value": "country"}, "operator": "equals",
       "targetType": "static", "targetValue": "US"}
    ],
    "actions": [
      {"locator": {"type": "id", "value": "zip"}, "valueType": "static", "value": "00000"}
    ],
    "lastMatched": false
  }
]"#;

type TestEngine = Engine<Page, MemoryStore, RecordingNotifier>;

fn engine_with(page: Page, rules: Vec<Rule>) -> TestEngine {
    let site = site_key(page.url()).unwrap();
    assert_eq!(site, SITE);
    let store = MemoryStore::new().with_site(site.clone(), rules);
    Engine::new(page, store, RecordingNotifier::new(), site, EngineConfig::default())
}

fn checkout() -> Page {
    Page::from_yaml(CHECKOUT_PAGE).unwrap()
}

fn element(engine: &TestEngine, id: &str) -> NodeId {
    engine.document().element_by_id(id).unwrap()
}

fn select_country(engine: &mut TestEngine, index: usize) {
    let country = element(engine, "country");
    engine.document_mut().set_selected_index(country, Some(index));
}

// ===== Country → zip scenarios =====

#[test]
fn test_us_selected_writes_zip_once() {
    let mut engine = engine_with(checkout(), import_site_rules(COUNTRY_RULES).unwrap());
    assert_eq!(engine.handle(Command::ReloadRules), Reply::Reloaded(1));

    let zip = element(&engine, "zip");
    assert_eq!(engine.document().control_value(zip), "00000");
    assert_eq!(engine.document().event_count(zip, ControlEvent::Change), 1);
    assert_eq!(engine.notifier().counts(), &[1]);
    assert!(engine.store().rules_for(SITE)[0].last_matched);

    // a second pass leaves the already-correct field alone
    assert_eq!(engine.run_all(false), 1);
    assert_eq!(engine.document().event_count(zip, ControlEvent::Change), 1);
}

#[test]
fn test_ca_selected_leaves_zip_untouched() {
    let mut engine = engine_with(checkout(), import_site_rules(COUNTRY_RULES).unwrap());
    select_country(&mut engine, 1);
    engine.reload_rules();

    let zip = element(&engine, "zip");
    assert_eq!(engine.document().control_value(zip), "");
    assert!(engine.document().events().is_empty());
    assert_eq!(engine.notifier().last(), Some(0));
    assert!(!engine.rules()[0].last_matched);
}

#[test]
fn test_country_change_reevaluates_after_debounce() {
    let start = Instant::now();
    let mut engine = engine_with(checkout(), import_site_rules(COUNTRY_RULES).unwrap());
    select_country(&mut engine, 1);
    engine.reload_rules();
    assert!(!engine.rules()[0].last_matched);

    // the page re-renders around the select after the user picks US
    select_country(&mut engine, 0);
    let status = element(&engine, "status");
    engine.document_mut().edit_text(status, "updating");
    assert!(engine.flush(start));

    assert_eq!(engine.tick(start + Duration::from_millis(100)), None);
    assert_eq!(engine.tick(start + Duration::from_millis(500)), Some(1));
    let zip = element(&engine, "zip");
    assert_eq!(engine.document().control_value(zip), "00000");
    assert_eq!(engine.notifier().counts(), &[0, 1]);
}

// ===== Debounce =====

#[test]
fn test_mutation_burst_runs_one_pass() {
    let start = Instant::now();
    let rules = vec![Rule::new("always")];
    let mut engine = engine_with(checkout(), rules);
    engine.reload_rules();
    let passes_before = engine.notifier().counts().len();

    let status = element(&engine, "status");
    for i in 0..20u64 {
        engine
            .document_mut()
            .set_attribute(status, "data-tick", &i.to_string());
        engine.flush(start + Duration::from_millis(i * 50));
        assert_eq!(engine.tick(start + Duration::from_millis(i * 50)), None);
    }
    let last = start + Duration::from_millis(19 * 50);
    assert_eq!(engine.tick(last + Duration::from_millis(500)), Some(1));
    assert_eq!(engine.tick(last + Duration::from_secs(10)), None);
    assert_eq!(engine.notifier().counts().len(), passes_before + 1);
}

#[test]
fn test_config_limits_observation_scope() {
    let start = Instant::now();
    let config = EngineConfig::from_yaml("debounce_ms: 200\nobserve:\n  attributes: false\n").unwrap();
    let page = checkout();
    let store = MemoryStore::new().with_site(SITE, vec![Rule::new("always")]);
    let mut engine = Engine::new(page, store, RecordingNotifier::new(), SITE, config);
    engine.reload_rules();

    let status = engine.document().element_by_id("status").unwrap();
    engine.document_mut().set_attribute(status, "class", "busy");
    assert!(!engine.flush(start));

    engine.document_mut().edit_text(status, "done");
    assert!(engine.flush(start));
    assert_eq!(engine.tick(start + Duration::from_millis(200)), Some(1));
}

// ===== Trigger modes =====

#[test]
fn test_manual_rule_only_runs_when_forced() {
    let start = Instant::now();
    let manual = Rule::new("fill region")
        .manual()
        .with_action(Action::set(Locator::name("region"), "Ontario"));
    let mut engine = engine_with(checkout(), vec![manual]);
    engine.reload_rules();

    let region = engine.document().query_selector("[name=region]").unwrap().unwrap();
    assert_eq!(engine.document().control_value(region), "");

    let body = engine.document().body();
    engine.document_mut().set_attribute(body, "class", "ready");
    engine.flush(start);
    assert_eq!(engine.tick(start + Duration::from_millis(500)), Some(0));
    assert_eq!(engine.document().control_value(region), "");

    assert_eq!(engine.handle(Command::RunAll), Reply::Count(1));
    assert_eq!(engine.document().control_value(region), "Ontario");
    assert!(engine.store().rules_for(SITE)[0].last_matched);
}

// ===== Condition semantics through the engine =====

#[test]
fn test_selection_label_and_contains() {
    let mut engine = engine_with(checkout(), Vec::new());
    let label_not_equal = Rule::new("not United States")
        .with_condition(Condition::not_equals(Locator::id("country"), "United States"));
    let label_equal = Rule::new("is United States")
        .with_condition(Condition::equals(Locator::id("country"), "United States"));
    let partial = Rule::new("united")
        .with_condition(Condition::contains(Locator::id("country"), "Unit"));

    assert_eq!(engine.handle(Command::RunOne(label_not_equal)), Reply::Matched(false));
    assert_eq!(engine.handle(Command::RunOne(label_equal)), Reply::Matched(true));
    assert_eq!(engine.handle(Command::RunOne(partial)), Reply::Matched(true));
}

#[test]
fn test_missing_locator_blocks_other_conditions() {
    let mut engine = engine_with(checkout(), Vec::new());
    let rule = Rule::new("ghost")
        .with_condition(Condition::equals(Locator::id("country"), "US"))
        .with_condition(Condition::equals(Locator::selector("#ghost"), ""))
        .with_action(Action::set(Locator::id("zip"), "11111"));
    assert_eq!(engine.handle(Command::RunOne(rule)), Reply::Matched(false));
    let zip = element(&engine, "zip");
    assert_eq!(engine.document().control_value(zip), "");
}

#[test]
fn test_copy_between_controls() {
    let mut engine = engine_with(checkout(), Vec::new());
    let rule = Rule::new("mirror")
        .with_action(Action::copy_from(Locator::name("region"), Locator::id("country")))
        .with_action(Action::copy_from(Locator::id("status"), Locator::name("region")));
    assert_eq!(engine.handle(Command::RunOne(rule)), Reply::Matched(true));
    let status = element(&engine, "status");
    assert_eq!(engine.document().text_content(status), "US");
}

// ===== Invalidation =====

#[test]
fn test_invalidation_stops_everything() {
    let start = Instant::now();
    let mut engine = engine_with(checkout(), import_site_rules(COUNTRY_RULES).unwrap());
    engine.reload_rules();
    engine.notifier_mut().fail_with(StoreError::ContextInvalidated);

    assert_eq!(engine.handle(Command::RunAll), Reply::Count(1));
    assert!(engine.is_invalidated());
    let saves = engine.store().save_count();

    let status = element(&engine, "status");
    engine.document_mut().edit_text(status, "changed");
    assert!(!engine.flush(start));
    assert_eq!(engine.tick(start + Duration::from_secs(1)), None);
    assert_eq!(engine.handle(Command::RunAll), Reply::Count(0));
    assert_eq!(engine.handle(Command::ReloadRules), Reply::Reloaded(0));
    assert_eq!(engine.store().save_count(), saves);
}

// ===== Picker =====

#[test]
fn test_picked_locator_drives_a_rule() {
    let mut engine = engine_with(checkout(), Vec::new());
    engine.handle(Command::StartPicker);
    let region = engine.document().query_selector("[name=region]").unwrap().unwrap();
    let Reply::Picked(picked) = engine.handle(Command::PickElement(region)) else {
        panic!("picker did not capture the element");
    };
    assert_eq!(picked.locator, Locator::name("region"));

    let rule = Rule::new("picked").with_action(Action::set(picked.locator, "Quebec"));
    engine.handle(Command::RunOne(rule));
    assert_eq!(engine.document().control_value(region), "Quebec");
}
