// src/engine/launcher.rs

//! Pluggable rebuild launcher.
//!
//! The runtime talks to a `RunLauncher` instead of the executor directly, so
//! tests can swap in a fake that records which runs were started and
//! cancelled without touching the filesystem.

use std::collections::HashMap;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::dag::{BoxFuture, Executor, TaskName};
use crate::engine::{RunId, RunOutcome, RuntimeEvent};
use crate::errors::Result;

/// Starts and cancels rebuilds.
///
/// Implementations report completion by sending
/// [`RuntimeEvent::RunFinished`] into the runtime channel.
pub trait RunLauncher: Send {
    fn start_run(&mut self, run_id: RunId, paths: Vec<String>) -> BoxFuture<'_, Result<()>>;

    /// Abort a run. A cancelled run must not report completion.
    fn cancel_run(&mut self, run_id: RunId) -> BoxFuture<'_, Result<()>>;
}

/// Runs one task of the graph per rebuild, each in its own Tokio task.
pub struct RealRunLauncher {
    executor: Executor,
    task: TaskName,
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    active: HashMap<RunId, JoinHandle<()>>,
}

impl std::fmt::Debug for RealRunLauncher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealRunLauncher")
            .field("task", &self.task)
            .field("active", &self.active.len())
            .finish_non_exhaustive()
    }
}

impl RealRunLauncher {
    pub fn new(
        executor: Executor,
        task: impl Into<TaskName>,
        runtime_tx: mpsc::Sender<RuntimeEvent>,
    ) -> Self {
        Self {
            executor,
            task: task.into(),
            runtime_tx,
            active: HashMap::new(),
        }
    }
}

impl RunLauncher for RealRunLauncher {
    fn start_run(&mut self, run_id: RunId, paths: Vec<String>) -> BoxFuture<'_, Result<()>> {
        self.active.retain(|_, handle| !handle.is_finished());

        let executor = self.executor.clone();
        let task = self.task.clone();
        let tx = self.runtime_tx.clone();

        info!(run_id, task = %task, changed = paths.len(), "starting rebuild");
        debug!(run_id, ?paths, "changed paths");

        let handle = tokio::spawn(async move {
            let outcome = match executor.run(&task).await {
                Ok(()) => RunOutcome::Success,
                Err(err) => {
                    error!(run_id, task = %task, error = %err, "rebuild failed");
                    RunOutcome::Failed
                }
            };
            let _ = tx.send(RuntimeEvent::RunFinished { run_id, outcome }).await;
        });
        self.active.insert(run_id, handle);

        Box::pin(async { Ok(()) })
    }

    fn cancel_run(&mut self, run_id: RunId) -> BoxFuture<'_, Result<()>> {
        match self.active.remove(&run_id) {
            Some(handle) => {
                info!(run_id, "cancelling rebuild");
                handle.abort();
            }
            None => debug!(run_id, "rebuild already finished; nothing to cancel"),
        }
        Box::pin(async { Ok(()) })
    }
}

impl Drop for RealRunLauncher {
    fn drop(&mut self) {
        for (_, handle) in self.active.drain() {
            handle.abort();
        }
    }
}
