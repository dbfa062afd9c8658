// src/engine/queue.rs

use std::collections::{BTreeSet, VecDeque};

use tracing::debug;

/// Change batches that arrived while a rebuild was running.
///
/// - Each entry is the set of paths for one future rebuild.
/// - `max_runs` (`watch.queue_length`) caps how many future rebuilds are
///   remembered. Once the cap is reached, new paths are merged into the last
///   batch instead of queueing another rebuild.
#[derive(Debug)]
pub struct TriggerQueue {
    max_runs: usize,
    runs: VecDeque<BTreeSet<String>>,
}

impl TriggerQueue {
    /// `max_runs` is clamped to at least 1.
    pub fn new(max_runs: usize) -> Self {
        Self {
            max_runs: max_runs.max(1),
            runs: VecDeque::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Number of queued rebuilds.
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn record(&mut self, paths: Vec<String>) {
        if self.runs.len() < self.max_runs {
            self.runs.push_back(paths.into_iter().collect());
            debug!(queued = self.runs.len(), "queued rebuild");
        } else if let Some(last) = self.runs.back_mut() {
            last.extend(paths);
            debug!(
                max_runs = self.max_runs,
                "queue full; merged change into last queued rebuild"
            );
        }
    }

    /// Paths for the next queued rebuild, oldest first.
    pub fn next_batch(&mut self) -> Option<Vec<String>> {
        self.runs.pop_front().map(|batch| batch.into_iter().collect())
    }

    pub fn clear(&mut self) {
        self.runs.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(p: &[&str]) -> Vec<String> {
        p.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn default_length_coalesces_everything_into_one_run() {
        let mut q = TriggerQueue::new(1);
        q.record(paths(&["a.js"]));
        q.record(paths(&["b.js"]));
        q.record(paths(&["a.js"]));

        assert_eq!(q.len(), 1);
        assert_eq!(q.next_batch(), Some(paths(&["a.js", "b.js"])));
        assert!(q.is_empty());
    }

    #[test]
    fn longer_queue_keeps_separate_runs() {
        let mut q = TriggerQueue::new(2);
        q.record(paths(&["a.js"]));
        q.record(paths(&["b.js"]));
        q.record(paths(&["c.js"]));

        assert_eq!(q.next_batch(), Some(paths(&["a.js"])));
        assert_eq!(q.next_batch(), Some(paths(&["b.js", "c.js"])));
        assert_eq!(q.next_batch(), None);
    }

    #[test]
    fn zero_length_is_clamped() {
        let mut q = TriggerQueue::new(0);
        q.record(paths(&["a.js"]));
        assert_eq!(q.len(), 1);
    }
}
