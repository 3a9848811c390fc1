//! Per-site rule storage and JSON import/export.
//!
//! Rule sets are keyed by site (the page hostname, see [`site_key`]). Two
//! file shapes exist: a single-site file is a JSON array of rules, a full
//! backup is an object mapping site keys to such arrays. Imports are
//! all-or-nothing: one malformed rule rejects the whole document.

use crate::engine::{MatchNotifier, RuleSink, RuleSource};
use crate::result::{FormpilotError, FormpilotResult, StoreError};
use crate::rule::Rule;
use serde_json::Value;
use std::collections::BTreeMap;
use url::Url;

/// Storage keys that hold editor state rather than rule sets
pub const RESERVED_KEYS: [&str; 2] = ["draftState", "pickerResult"];

/// Full backup: site key to rule set
pub type Backup = BTreeMap<String, Vec<Rule>>;

/// Site key of a page URL: the hostname of `http`/`https` URLs
#[must_use]
pub fn site_key(page_url: &str) -> Option<String> {
    let parsed = Url::parse(page_url).ok()?;
    match parsed.scheme() {
        "http" | "https" => parsed.host_str().map(str::to_string),
        _ => None,
    }
}

/// Whether `key` names editor state instead of a site
#[must_use]
pub fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// File name used when exporting a site's rules
#[must_use]
pub fn export_file_name(site: &str) -> String {
    format!("{site}_rules.json")
}

fn parse_rules(value: Value, context: &str) -> FormpilotResult<Vec<Rule>> {
    let Value::Array(items) = value else {
        return Err(FormpilotError::malformed(format!(
            "{context}: expected an array of rules"
        )));
    };
    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value(item)
                .map_err(|err| FormpilotError::malformed(format!("{context}: rule {index}: {err}")))
        })
        .collect()
}

/// Import a single-site rules file (a JSON array of rules)
pub fn import_site_rules(json: &str) -> FormpilotResult<Vec<Rule>> {
    let value: Value = serde_json::from_str(json)?;
    parse_rules(value, "single-site import")
}

/// Export a site's rules as pretty-printed JSON
pub fn export_site_rules(rules: &[Rule]) -> FormpilotResult<String> {
    Ok(serde_json::to_string_pretty(rules)?)
}

/// Import a full backup, skipping reserved editor keys.
///
/// A top-level array is a single-site file and is rejected as the wrong kind.
pub fn import_backup(json: &str) -> FormpilotResult<Backup> {
    let value: Value = serde_json::from_str(json)?;
    let entries = match value {
        Value::Object(entries) => entries,
        Value::Array(_) => {
            return Err(FormpilotError::WrongBackupKind {
                expected: "a full backup object, found a single-site rule array",
            })
        }
        _ => return Err(FormpilotError::malformed("full backup must be a JSON object")),
    };
    let mut backup = Backup::new();
    for (site, rules) in entries {
        if is_reserved(&site) {
            continue;
        }
        let rules = parse_rules(rules, &format!("site {site}"))?;
        backup.insert(site, rules);
    }
    Ok(backup)
}

/// Export a full backup as pretty-printed JSON
pub fn export_backup(backup: &Backup) -> FormpilotResult<String> {
    Ok(serde_json::to_string_pretty(backup)?)
}

/// In-memory rule store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    sites: Backup,
    invalidated: bool,
    save_count: usize,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding a backup
    #[must_use]
    pub fn from_backup(backup: Backup) -> Self {
        Self {
            sites: backup,
            ..Self::default()
        }
    }

    /// Add a site's rules
    #[must_use]
    pub fn with_site(mut self, site: impl Into<String>, rules: Vec<Rule>) -> Self {
        self.sites.insert(site.into(), rules);
        self
    }

    /// Rules stored for `site`
    #[must_use]
    pub fn rules_for(&self, site: &str) -> &[Rule] {
        self.sites.get(site).map(Vec::as_slice).unwrap_or_default()
    }

    /// Stored site keys with their rule counts
    pub fn sites(&self) -> impl Iterator<Item = (&str, usize)> {
        self.sites
            .iter()
            .map(|(site, rules)| (site.as_str(), rules.len()))
    }

    /// Merge a backup in, replacing sites that already exist
    pub fn restore(&mut self, backup: Backup) {
        self.sites.extend(backup);
    }

    /// Snapshot of every site
    #[must_use]
    pub fn backup(&self) -> Backup {
        self.sites.clone()
    }

    /// Number of successful saves
    #[must_use]
    pub const fn save_count(&self) -> usize {
        self.save_count
    }

    /// Simulate losing the hosting context: every later call fails
    pub fn invalidate(&mut self) {
        self.invalidated = true;
    }

    const fn check(&self) -> Result<(), StoreError> {
        if self.invalidated {
            Err(StoreError::ContextInvalidated)
        } else {
            Ok(())
        }
    }
}

impl RuleSource for MemoryStore {
    fn load_rules(&mut self, site: &str) -> Result<Option<Vec<Rule>>, StoreError> {
        self.check()?;
        Ok(self.sites.get(site).cloned())
    }
}

impl RuleSink for MemoryStore {
    fn save_rules(&mut self, site: &str, rules: &[Rule]) -> Result<(), StoreError> {
        self.check()?;
        self.sites.insert(site.to_string(), rules.to_vec());
        self.save_count += 1;
        Ok(())
    }
}

/// Notifier that records every reported count
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    counts: Vec<usize>,
    failure: Option<StoreError>,
}

impl RecordingNotifier {
    /// Create a notifier
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts reported so far
    #[must_use]
    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Most recent count
    #[must_use]
    pub fn last(&self) -> Option<usize> {
        self.counts.last().copied()
    }

    /// Fail every later notification with `error`
    pub fn fail_with(&mut self, error: StoreError) {
        self.failure = Some(error);
    }
}

impl MatchNotifier for RecordingNotifier {
    fn notify(&mut self, count: usize) -> Result<(), StoreError> {
        if let Some(error) = &self.failure {
            return Err(error.clone());
        }
        self.counts.push(count);
        Ok(())
    }
}
