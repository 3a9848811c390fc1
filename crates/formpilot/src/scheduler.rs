//! Debounced change scheduler.
//!
//! A burst of mutations produces a single automatic pass once the page has
//! been quiet for the debounce window. The scheduler owns no timer: callers
//! pass the current [`Instant`] to every entry point and ask [`ChangeScheduler::poll`]
//! whether the deadline has been reached.
//!
//! ```text
//!            mutation                deadline reached
//!   Idle ─────────────▶ Pending ───────────────────────▶ (fire) ─▶ Idle
//!                        │   ▲
//!                        └───┘ mutation re-arms the deadline
//!
//!   invalidate() from any state ─▶ Terminated (absorbing)
//! ```

use crate::config::{EngineConfig, ObserveOptions};
use crate::dom::MutationRecord;
use std::time::{Duration, Instant};

/// Scheduler state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Nothing pending
    Idle,
    /// A pass fires at `deadline` unless re-armed
    Pending {
        /// When the pass becomes due
        deadline: Instant,
    },
    /// Observation stopped for good
    Terminated,
}

/// Scheduler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Records that armed or re-armed the deadline
    pub observed: u64,
    /// Records outside the observation scope
    pub ignored: u64,
    /// Passes fired
    pub fired: u64,
}

/// Coalesces mutation bursts into single passes
#[derive(Debug, Clone)]
pub struct ChangeScheduler {
    window: Duration,
    observe: ObserveOptions,
    state: SchedulerState,
    stats: SchedulerStats,
}

impl ChangeScheduler {
    /// Create a scheduler with the given quiet window, observing everything
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            observe: ObserveOptions::default(),
            state: SchedulerState::Idle,
            stats: SchedulerStats::default(),
        }
    }

    /// Create a scheduler from engine configuration
    #[must_use]
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.debounce()).with_observe(config.observe)
    }

    /// Restrict the observation scope
    #[must_use]
    pub const fn with_observe(mut self, observe: ObserveOptions) -> Self {
        self.observe = observe;
        self
    }

    /// Feed observed records; returns whether the deadline was (re-)armed
    pub fn observe(&mut self, records: &[MutationRecord], now: Instant) -> bool {
        if self.is_terminated() {
            return false;
        }
        let relevant = records
            .iter()
            .filter(|record| self.observe.accepts(record.kind))
            .count();
        self.stats.ignored += (records.len() - relevant) as u64;
        if relevant == 0 {
            return false;
        }
        self.stats.observed += relevant as u64;
        self.notify_change(now)
    }

    /// Record one change; returns whether the deadline was (re-)armed
    pub fn notify_change(&mut self, now: Instant) -> bool {
        if self.is_terminated() {
            return false;
        }
        self.state = SchedulerState::Pending {
            deadline: now + self.window,
        };
        true
    }

    /// Whether a pass is due at `now`; firing returns the scheduler to idle
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.state {
            SchedulerState::Pending { deadline } if now >= deadline => {
                self.state = SchedulerState::Idle;
                self.stats.fired += 1;
                true
            }
            _ => false,
        }
    }

    /// Pending deadline, if any
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        match self.state {
            SchedulerState::Pending { deadline } => Some(deadline),
            SchedulerState::Idle | SchedulerState::Terminated => None,
        }
    }

    /// Drop any pending pass and stop observing permanently
    pub fn invalidate(&mut self) {
        self.state = SchedulerState::Terminated;
    }

    /// Whether the scheduler has been invalidated
    #[must_use]
    pub const fn is_terminated(&self) -> bool {
        matches!(self.state, SchedulerState::Terminated)
    }

    /// Current state
    #[must_use]
    pub const fn state(&self) -> SchedulerState {
        self.state
    }

    /// Counters
    #[must_use]
    pub const fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Quiet window
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }
}

impl Default for ChangeScheduler {
    fn default() -> Self {
        Self::from_config(&EngineConfig::default())
    }
}
