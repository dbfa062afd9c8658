// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fileset;
pub mod fs;
pub mod logging;
pub mod pipeline;
pub mod transform;
pub mod types;
pub mod watch;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::cli::CliArgs;
use crate::config::{config_root_dir, load_and_validate, ConfigFile};
use crate::dag::standard::{WATCH_REBUILD_TASK, WATCH_TASK};
use crate::dag::{Executor, TaskGraph};
use crate::engine::{CoreRuntime, RealRunLauncher, Runtime, RuntimeEvent};
use crate::errors::{PipedagError, Result};
use crate::exec::ProcessBridge;
use crate::fs::RealFileSystem;
use crate::pipeline::PipelineActions;
use crate::watch::{spawn_watcher, WatchRule};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading and the task graph
/// - the executor with the real filesystem and process bridge
/// - for `watch`: the file watcher and the watch loop
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;
    let root = config_root_dir(&config_path);
    let graph = TaskGraph::from_config(&cfg)?;

    if args.list {
        for name in graph.names() {
            println!("{name}");
        }
        return Ok(());
    }

    if !graph.contains(&args.task) {
        return Err(PipedagError::TaskNotFound(args.task));
    }

    if args.dry_run {
        print_dry_run(&graph, &args.task, &root)?;
        return Ok(());
    }

    let (executor, bridge) = executor_for(graph, &root);

    if args.task == WATCH_TASK {
        return run_watch(&cfg, &root, executor, bridge).await;
    }

    let result = executor.run(&args.task).await;
    if result.is_ok() {
        wait_for_servers(&bridge).await?;
    }
    bridge.shutdown().await;
    result
}

/// Executor over the real filesystem, with commands run from `root`.
pub fn executor_for(graph: TaskGraph, root: &Path) -> (Executor, ProcessBridge) {
    let bridge = ProcessBridge::new(root);
    let actions = PipelineActions::new(root, Arc::new(RealFileSystem), bridge.clone());
    (Executor::new(Arc::new(graph), Arc::new(actions)), bridge)
}

/// Build the graph for `cfg` and run `task` once, without watching.
pub async fn run_task(cfg: &ConfigFile, root: &Path, task: &str) -> Result<()> {
    let (executor, bridge) = executor_for(TaskGraph::from_config(cfg)?, root);
    let result = executor.run(task).await;
    bridge.shutdown().await;
    result
}

/// Keep the process alive while a server started by the task is running.
async fn wait_for_servers(bridge: &ProcessBridge) -> Result<()> {
    if bridge.running_servers().await == 0 {
        return Ok(());
    }

    info!("server running; press Ctrl-C to stop");
    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            if let Err(e) = signal {
                warn!(error = %e, "failed to listen for Ctrl-C");
            }
            info!("interrupted; stopping");
            Ok(())
        }
        exit = bridge.wait_for_servers() => match exit {
            Some(exit) if exit.code != Some(0) => Err(PipedagError::SubprocessError {
                command: exit.name,
                reason: format!("server exited with code {}", exit.code.unwrap_or(-1)),
            }),
            Some(exit) => {
                info!(server = %exit.name, "server exited");
                Ok(())
            }
            None => Ok(()),
        },
    }
}

/// Run the initial `watch` task, then rebuild on every debounced change until
/// Ctrl-C.
async fn run_watch(
    cfg: &ConfigFile,
    root: &Path,
    executor: Executor,
    bridge: ProcessBridge,
) -> Result<()> {
    let watch = cfg.watch();
    let rule = WatchRule::compile(WATCH_REBUILD_TASK, &watch.patterns)?;
    if rule.is_empty() {
        warn!("no [watch] patterns configured; changes will not trigger rebuilds");
    }

    if let Err(err) = executor.run(WATCH_TASK).await {
        error!(error = %err, "initial build failed; watching for changes");
    }

    let (rt_tx, rt_rx) = mpsc::channel::<RuntimeEvent>(64);
    let _watcher = spawn_watcher(root, rule.clone(), rt_tx.clone())?;

    // Ctrl-C → graceful shutdown.
    {
        let tx = rt_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "failed to listen for Ctrl-C");
                return;
            }
            let _ = tx.send(RuntimeEvent::ShutdownRequested).await;
        });
    }

    let core = CoreRuntime::new(watch.triggered_while_running_behaviour, watch.queue_length);
    let launcher = RealRunLauncher::new(executor, rule.task(), rt_tx);
    let runtime = Runtime::new(core, rt_rx, launcher, Duration::from_millis(watch.debounce_ms));

    debug!(?runtime, "entering watch loop");
    let launcher = runtime.run().await?;
    drop(launcher);
    bridge.shutdown().await;
    Ok(())
}

/// Print the task tree of `task` without running anything.
fn print_dry_run(graph: &TaskGraph, task: &str, root: &Path) -> Result<()> {
    println!("pipedag dry-run");
    println!("  root = {}", root.display());
    println!("  task = {task}");
    println!();
    for line in graph.describe(task)? {
        println!("{line}");
    }
    debug!("dry-run complete (no execution)");
    Ok(())
}
