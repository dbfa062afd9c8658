// src/engine/core.rs

//! Pure core runtime state machine.
//!
//! The core consumes [`RuntimeEvent`]s and produces a list of commands
//! describing what the IO shell should do next. It has no channels, no Tokio
//! types and performs no IO, so it can be unit tested directly.

use tracing::{debug, info, warn};

use crate::engine::queue::TriggerQueue;
use crate::engine::{RunId, RunOutcome, RuntimeEvent};
use crate::types::TriggerWhileRunningBehaviour;

/// Command produced by the pure core, to be executed by the outer IO shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreCommand {
    /// Start a rebuild for the given changed paths.
    StartRun { run_id: RunId, paths: Vec<String> },
    /// Abort an in-flight rebuild.
    CancelRun { run_id: RunId },
    /// Request that the loop exits.
    RequestExit,
}

/// Decision returned by the core after handling a single `RuntimeEvent`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<CoreCommand>,
    pub keep_running: bool,
}

impl CoreStep {
    fn continue_with(commands: Vec<CoreCommand>) -> Self {
        Self {
            commands,
            keep_running: true,
        }
    }
}

#[derive(Debug)]
pub struct CoreRuntime {
    behaviour: TriggerWhileRunningBehaviour,
    queue: TriggerQueue,
    running: Option<RunId>,
    next_run_id: RunId,
    failed_runs: usize,
}

impl CoreRuntime {
    pub fn new(behaviour: TriggerWhileRunningBehaviour, queue_length: usize) -> Self {
        Self {
            behaviour,
            queue: TriggerQueue::new(queue_length),
            running: None,
            next_run_id: 1,
            failed_runs: 0,
        }
    }

    /// Id of the in-flight rebuild, if any.
    pub fn running(&self) -> Option<RunId> {
        self.running
    }

    pub fn is_idle(&self) -> bool {
        self.running.is_none()
    }

    /// Rebuilds that finished with a failure so far.
    pub fn failed_runs(&self) -> usize {
        self.failed_runs
    }

    pub fn step(&mut self, event: RuntimeEvent) -> CoreStep {
        match event {
            RuntimeEvent::PathChanged { path } => self.handle_trigger(vec![path]),
            RuntimeEvent::Triggered { paths } => self.handle_trigger(paths),
            RuntimeEvent::RunFinished { run_id, outcome } => self.handle_finished(run_id, outcome),
            RuntimeEvent::ShutdownRequested => {
                let mut commands = Vec::new();
                if let Some(run_id) = self.running.take() {
                    commands.push(CoreCommand::CancelRun { run_id });
                }
                self.queue.clear();
                commands.push(CoreCommand::RequestExit);
                CoreStep {
                    commands,
                    keep_running: false,
                }
            }
        }
    }

    fn handle_trigger(&mut self, paths: Vec<String>) -> CoreStep {
        if paths.is_empty() {
            return CoreStep::continue_with(Vec::new());
        }

        let Some(current) = self.running else {
            return CoreStep::continue_with(vec![self.start_run(paths)]);
        };

        match self.behaviour {
            TriggerWhileRunningBehaviour::Queue => {
                self.queue.record(paths);
                CoreStep::continue_with(Vec::new())
            }
            TriggerWhileRunningBehaviour::Drop => {
                debug!(run_id = current, ?paths, "rebuild in progress; dropping change");
                CoreStep::continue_with(Vec::new())
            }
            TriggerWhileRunningBehaviour::Cancel => {
                info!(run_id = current, "change during rebuild; restarting");
                CoreStep::continue_with(vec![
                    CoreCommand::CancelRun { run_id: current },
                    self.start_run(paths),
                ])
            }
        }
    }

    fn handle_finished(&mut self, run_id: RunId, outcome: RunOutcome) -> CoreStep {
        if self.running != Some(run_id) {
            debug!(run_id, "ignoring completion of stale rebuild");
            return CoreStep::continue_with(Vec::new());
        }
        self.running = None;

        match outcome {
            RunOutcome::Success => info!(run_id, "rebuild finished"),
            RunOutcome::Failed => {
                self.failed_runs += 1;
                warn!(run_id, "rebuild failed; waiting for further changes");
            }
        }

        let commands = match self.queue.next_batch() {
            Some(paths) => vec![self.start_run(paths)],
            None => Vec::new(),
        };
        CoreStep::continue_with(commands)
    }

    fn start_run(&mut self, paths: Vec<String>) -> CoreCommand {
        let run_id = self.next_run_id;
        self.next_run_id += 1;
        self.running = Some(run_id);
        CoreCommand::StartRun { run_id, paths }
    }
}
