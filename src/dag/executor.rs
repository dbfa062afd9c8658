// src/dag/executor.rs

//! Runs tasks from a [`TaskGraph`].
//!
//! - Series children run strictly in order; the first failure aborts the rest.
//! - Parallel children run as separate Tokio tasks. The executor waits for
//!   all of them, returns the first failure in declared order and logs the
//!   others.
//! - Leaf actions are delegated to an [`ActionRunner`], so the executor itself
//!   performs no IO.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use anyhow::anyhow;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::dag::graph::TaskGraph;
use crate::dag::task::{Action, TaskBody, TaskName};
use crate::errors::{PipedagError, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Performs primitive actions.
///
/// Production code uses `pipeline::PipelineActions`; tests plug in fakes that
/// record invocations or inject failures.
pub trait ActionRunner: Send + Sync {
    fn run_action<'a>(&'a self, task: &'a str, action: &'a Action) -> BoxFuture<'a, Result<()>>;
}

/// Task executor. Cheap to clone.
#[derive(Clone)]
pub struct Executor {
    graph: Arc<TaskGraph>,
    runner: Arc<dyn ActionRunner>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("tasks", &self.graph.len())
            .finish_non_exhaustive()
    }
}

impl Executor {
    pub fn new(graph: Arc<TaskGraph>, runner: Arc<dyn ActionRunner>) -> Self {
        Self { graph, runner }
    }

    /// Run `name` and everything below it.
    pub async fn run(&self, name: &str) -> Result<()> {
        self.clone().run_owned(name.to_string()).await
    }

    fn run_owned(self, name: TaskName) -> BoxFuture<'static, Result<()>> {
        Box::pin(async move {
            let graph = Arc::clone(&self.graph);
            let task = graph
                .get(&name)
                .ok_or_else(|| PipedagError::TaskNotFound(name.clone()))?;

            let started = Instant::now();
            info!(task = %name, "starting");

            let result = match &task.body {
                TaskBody::Action(action) => self
                    .runner
                    .run_action(&name, action)
                    .await
                    .map_err(|err| wrap_leaf_error(&name, err)),
                TaskBody::Series(children) => self.run_series(children).await,
                TaskBody::Parallel(children) => self.run_parallel(children).await,
            };

            let elapsed_ms = started.elapsed().as_millis() as u64;
            match &result {
                Ok(()) => info!(task = %name, elapsed_ms, "finished"),
                Err(err) if matches!(task.body, TaskBody::Action(_)) => {
                    error!(task = %name, elapsed_ms, error = %err, "errored")
                }
                Err(_) => warn!(task = %name, elapsed_ms, "aborted after child failure"),
            }

            result
        })
    }

    async fn run_series(&self, children: &[TaskName]) -> Result<()> {
        for child in children {
            self.clone().run_owned(child.clone()).await?;
        }
        Ok(())
    }

    async fn run_parallel(&self, children: &[TaskName]) -> Result<()> {
        let mut handles = ChildHandles(
            children
                .iter()
                .map(|child| {
                    let fut = self.clone().run_owned(child.clone());
                    (child.clone(), tokio::spawn(fut))
                })
                .collect(),
        );

        let mut first_err: Option<PipedagError> = None;

        for (child, handle) in handles.0.iter_mut() {
            let outcome = match handle.await {
                Ok(result) => result,
                Err(join_err) => Err(PipedagError::TaskError {
                    task: child.clone(),
                    source: Box::new(PipedagError::Other(anyhow!(
                        "task did not complete: {join_err}"
                    ))),
                }),
            };

            if let Err(err) = outcome {
                if first_err.is_none() {
                    first_err = Some(err);
                } else {
                    error!(task = %child, error = %err, "additional failure in parallel group");
                }
            }
        }

        match first_err {
            Some(err) => Err(err),
            None => {
                debug!(?children, "parallel group complete");
                Ok(())
            }
        }
    }
}

/// Spawned children of a concurrent group, keyed by what they run; aborted
/// if the group itself is dropped mid-run.
pub(crate) struct ChildHandles<K, T>(pub(crate) Vec<(K, JoinHandle<T>)>);

impl<K, T> Drop for ChildHandles<K, T> {
    fn drop(&mut self) {
        for (_, handle) in &self.0 {
            handle.abort();
        }
    }
}

fn wrap_leaf_error(task: &str, err: PipedagError) -> PipedagError {
    match err {
        already @ PipedagError::TaskError { .. } => already,
        other => PipedagError::TaskError {
            task: task.to_string(),
            source: Box::new(other),
        },
    }
}
