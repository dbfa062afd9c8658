use std::sync::{Arc, Mutex};

use pipedag::dag::BoxFuture;
use pipedag::engine::{RunId, RunLauncher, RunOutcome, RuntimeEvent};
use pipedag::errors::Result;
use tokio::sync::mpsc;

/// Everything the fake launcher was asked to do.
#[derive(Debug, Default, Clone)]
pub struct LauncherLog {
    pub started: Vec<(RunId, Vec<String>)>,
    pub cancelled: Vec<RunId>,
}

/// A fake run launcher that:
/// - records started and cancelled runs
/// - in auto-complete mode, immediately reports `RunFinished` with the
///   configured outcome; otherwise the test sends completions itself.
pub struct FakeRunLauncher {
    runtime_tx: mpsc::Sender<RuntimeEvent>,
    log: Arc<Mutex<LauncherLog>>,
    auto_complete: Option<RunOutcome>,
}

impl FakeRunLauncher {
    pub fn new(runtime_tx: mpsc::Sender<RuntimeEvent>, log: Arc<Mutex<LauncherLog>>) -> Self {
        Self {
            runtime_tx,
            log,
            auto_complete: None,
        }
    }

    pub fn auto_complete(mut self, outcome: RunOutcome) -> Self {
        self.auto_complete = Some(outcome);
        self
    }
}

impl RunLauncher for FakeRunLauncher {
    fn start_run(&mut self, run_id: RunId, paths: Vec<String>) -> BoxFuture<'_, Result<()>> {
        self.log.lock().unwrap().started.push((run_id, paths));
        let tx = self.runtime_tx.clone();
        let outcome = self.auto_complete;

        Box::pin(async move {
            if let Some(outcome) = outcome {
                tx.send(RuntimeEvent::RunFinished { run_id, outcome })
                    .await
                    .map_err(anyhow::Error::from)?;
            }
            Ok(())
        })
    }

    fn cancel_run(&mut self, run_id: RunId) -> BoxFuture<'_, Result<()>> {
        self.log.lock().unwrap().cancelled.push(run_id);
        Box::pin(async { Ok(()) })
    }
}
