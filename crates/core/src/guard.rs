use crate::domain::history::{History, HistoryEvent};

pub const DEFAULT_DUPLICATE_LOOKBACK: usize = 5;

/// Rejects a shot timestamp that already appears among the most recent history entries.
///
/// Slack retries event deliveries, so the same message timestamp can arrive more than once.
/// The comparison is exact equality against each entry's legacy code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DuplicateGuard {
    lookback: usize,
}

impl Default for DuplicateGuard {
    fn default() -> Self {
        Self { lookback: DEFAULT_DUPLICATE_LOOKBACK }
    }
}

impl DuplicateGuard {
    /// A lookback of 1 only compares against the latest entry.
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }

    pub fn lookback(&self) -> usize {
        self.lookback
    }

    pub fn is_duplicate(&self, history: &History, candidate_ts: f64) -> bool {
        history.events().iter().rev().take(self.lookback).map(HistoryEvent::code).any(|code| {
            code == candidate_ts
        })
    }
}
