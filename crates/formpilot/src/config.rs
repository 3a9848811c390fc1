//! Engine configuration.

use crate::dom::MutationKind;
use crate::result::FormpilotResult;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default debounce window before an automatic pass (500ms)
pub const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Default length of the picker's sample text
pub const DEFAULT_SAMPLE_TEXT_LEN: usize = 20;

/// Which mutation kinds wake the scheduler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserveOptions {
    /// Children added or removed anywhere in the subtree
    pub child_list: bool,
    /// Attribute changes
    pub attributes: bool,
    /// Text edited in place
    pub character_data: bool,
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self {
            child_list: true,
            attributes: true,
            character_data: true,
        }
    }
}

impl ObserveOptions {
    /// Whether records of `kind` are observed
    #[must_use]
    pub const fn accepts(&self, kind: MutationKind) -> bool {
        match kind {
            MutationKind::ChildList => self.child_list,
            MutationKind::Attributes => self.attributes,
            MutationKind::CharacterData => self.character_data,
        }
    }
}

/// Configuration for an [`Engine`](crate::Engine)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Quiet period required before an automatic pass, in milliseconds
    pub debounce_ms: u64,
    /// Observation scope
    pub observe: ObserveOptions,
    /// Characters of element text captured by the picker
    pub sample_text_len: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            observe: ObserveOptions::default(),
            sample_text_len: DEFAULT_SAMPLE_TEXT_LEN,
        }
    }
}

impl EngineConfig {
    /// Create a default config
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from YAML; missing keys keep their defaults
    pub fn from_yaml(source: &str) -> FormpilotResult<Self> {
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Set debounce window
    #[must_use]
    pub const fn with_debounce(mut self, ms: u64) -> Self {
        self.debounce_ms = ms;
        self
    }

    /// Set observation scope
    #[must_use]
    pub const fn with_observe(mut self, observe: ObserveOptions) -> Self {
        self.observe = observe;
        self
    }

    /// Set picker sample length
    #[must_use]
    pub const fn with_sample_text_len(mut self, len: usize) -> Self {
        self.sample_text_len = len;
        self
    }

    /// Debounce window as a duration
    #[must_use]
    pub const fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
