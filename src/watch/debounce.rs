// src/watch/debounce.rs

use std::collections::BTreeSet;
use std::time::Duration;

use tokio::time::Instant;

/// Coalesces bursts of path changes into one batch.
///
/// Every new path pushes the deadline out to `now + window`; the batch is
/// released once the deadline passes without further changes.
#[derive(Debug, Clone)]
pub struct Debouncer {
    window: Duration,
    pending: BTreeSet<String>,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: BTreeSet::new(),
            deadline: None,
        }
    }

    pub fn push(&mut self, path: impl Into<String>, now: Instant) {
        self.pending.insert(path.into());
        self.deadline = Some(now + self.window);
    }

    /// When the pending batch becomes due, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take the pending batch (sorted, deduplicated) if its deadline passed.
    pub fn take_if_due(&mut self, now: Instant) -> Option<Vec<String>> {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                Some(std::mem::take(&mut self.pending).into_iter().collect())
            }
            _ => None,
        }
    }
}
