// src/engine/runtime.rs

use std::fmt;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info};

use crate::errors::Result;
use crate::watch::Debouncer;

use super::core::CoreRuntime;
use super::launcher::RunLauncher;
use super::{CoreCommand, RuntimeEvent};

/// Async IO shell around [`CoreRuntime`].
///
/// Reads events from the channel, debounces path changes, feeds the core and
/// hands run start/cancel commands to a [`RunLauncher`].
pub struct Runtime<L: RunLauncher> {
    core: CoreRuntime,
    event_rx: mpsc::Receiver<RuntimeEvent>,
    launcher: L,
    debouncer: Debouncer,
}

impl<L: RunLauncher> fmt::Debug for Runtime<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .field("debouncer", &self.debouncer)
            .finish_non_exhaustive()
    }
}

impl<L: RunLauncher> Runtime<L> {
    pub fn new(
        core: CoreRuntime,
        event_rx: mpsc::Receiver<RuntimeEvent>,
        launcher: L,
        debounce: Duration,
    ) -> Self {
        Self {
            core,
            event_rx,
            launcher,
            debouncer: Debouncer::new(debounce),
        }
    }

    /// Main event loop. Returns the launcher once the loop exits.
    pub async fn run(mut self) -> Result<L> {
        info!("watch loop started");

        loop {
            let deadline = self.debouncer.deadline();

            let event = tokio::select! {
                received = self.event_rx.recv() => match received {
                    Some(event) => event,
                    None => {
                        info!("runtime event channel closed; exiting");
                        break;
                    }
                },
                _ = wait_until(deadline) => {
                    match self.debouncer.take_if_due(Instant::now()) {
                        Some(paths) => RuntimeEvent::Triggered { paths },
                        None => continue,
                    }
                }
            };

            if let RuntimeEvent::PathChanged { path } = event {
                debug!(path = %path, "change recorded; debouncing");
                self.debouncer.push(path, Instant::now());
                continue;
            }

            debug!(?event, "runtime received event");
            let step = self.core.step(event);

            for command in step.commands {
                self.execute_command(command).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping watch loop");
                break;
            }
        }

        info!("watch loop exiting");
        Ok(self.launcher)
    }

    async fn execute_command(&mut self, command: CoreCommand) -> Result<()> {
        match command {
            CoreCommand::StartRun { run_id, paths } => {
                self.launcher.start_run(run_id, paths).await?;
            }
            CoreCommand::CancelRun { run_id } => {
                self.launcher.cancel_run(run_id).await?;
            }
            CoreCommand::RequestExit => {
                debug!("core issued RequestExit command");
            }
        }
        Ok(())
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
