use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pipedag::dag::{Action, ActionRunner, BoxFuture};
use pipedag::errors::{PipedagError, Result};

/// What the fake runner observed, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunnerEvent {
    Started(String),
    Finished(String),
}

/// A fake action runner that:
/// - records when each leaf task starts and finishes
/// - sleeps for an optional per-task delay
/// - fails the tasks it was told to fail.
#[derive(Clone, Default)]
pub struct FakeActionRunner {
    events: Arc<Mutex<Vec<RunnerEvent>>>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    default_delay: Duration,
}

impl FakeActionRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, task: &str) -> Self {
        self.failing.insert(task.to_string());
        self
    }

    pub fn delay(mut self, task: &str, delay: Duration) -> Self {
        self.delays.insert(task.to_string(), delay);
        self
    }

    /// Delay applied to every task without its own delay.
    pub fn default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = delay;
        self
    }

    pub fn events(&self) -> Vec<RunnerEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Tasks in the order they started.
    pub fn started(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                RunnerEvent::Started(t) => Some(t),
                RunnerEvent::Finished(_) => None,
            })
            .collect()
    }

    pub fn was_started(&self, task: &str) -> bool {
        self.started().iter().any(|t| t == task)
    }

    /// Position of an event in the log, if it happened.
    pub fn position(&self, event: &RunnerEvent) -> Option<usize> {
        self.events().iter().position(|e| e == event)
    }
}

impl ActionRunner for FakeActionRunner {
    fn run_action<'a>(&'a self, task: &'a str, _action: &'a Action) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.events
                .lock()
                .unwrap()
                .push(RunnerEvent::Started(task.to_string()));

            let delay = self.delays.get(task).copied().unwrap_or(self.default_delay);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            self.events
                .lock()
                .unwrap()
                .push(RunnerEvent::Finished(task.to_string()));

            if self.failing.contains(task) {
                return Err(PipedagError::SubprocessError {
                    command: task.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            Ok(())
        })
    }
}
