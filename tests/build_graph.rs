mod common;

use std::time::Duration;

use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};
use crate::common::fake_runner::{FakeActionRunner, RunnerEvent};
use crate::common::{executor_with, init_tracing, with_timeout};

use pipedag::dag::standard::{
    BUILD_ASSETS_TASK, BUILD_PREREQUISITES, BUILD_TASK, PACK_TASK, WATCH_REBUILD_TASK, WATCH_TASK,
    WEBSERVER_TASK,
};
use pipedag::errors::PipedagError;

fn started(runner: &FakeActionRunner, task: &str) -> usize {
    runner
        .position(&RunnerEvent::Started(task.to_string()))
        .unwrap_or_else(|| panic!("{task} never started: {:?}", runner.events()))
}

fn finished(runner: &FakeActionRunner, task: &str) -> usize {
    runner
        .position(&RunnerEvent::Finished(task.to_string()))
        .unwrap_or_else(|| panic!("{task} never finished: {:?}", runner.events()))
}

#[tokio::test]
async fn build_copies_assets_only_after_every_prerequisite() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let runner = FakeActionRunner::new()
        .default_delay(Duration::from_millis(5))
        .delay("shaders", Duration::from_millis(40));
    let exec = executor_with(&cfg, runner.clone());

    with_timeout(exec.run(BUILD_TASK)).await.unwrap();

    let assets = started(&runner, BUILD_ASSETS_TASK);
    for task in BUILD_PREREQUISITES {
        assert!(finished(&runner, task) < assets, "{task} finished after assets started");
    }
}

#[tokio::test]
async fn prerequisites_run_concurrently() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let runner = FakeActionRunner::new().default_delay(Duration::from_millis(30));
    let exec = executor_with(&cfg, runner.clone());

    with_timeout(exec.run(BUILD_TASK)).await.unwrap();

    let first_finish = BUILD_PREREQUISITES
        .iter()
        .map(|t| finished(&runner, t))
        .min()
        .unwrap();
    for task in BUILD_PREREQUISITES {
        assert!(started(&runner, task) < first_finish, "{task} did not overlap");
    }
}

#[tokio::test]
async fn any_failing_prerequisite_stops_the_asset_copy() {
    init_tracing();
    for failing in BUILD_PREREQUISITES {
        let cfg = ConfigFileBuilder::new().build();
        let runner = FakeActionRunner::new()
            .default_delay(Duration::from_millis(2))
            .failing(failing);
        let exec = executor_with(&cfg, runner.clone());

        let err = with_timeout(exec.run(BUILD_TASK)).await.unwrap_err();

        assert_eq!(err.failed_task(), Some(failing));
        assert!(!runner.was_started(BUILD_ASSETS_TASK), "assets ran despite {failing}");
        for task in BUILD_PREREQUISITES {
            assert!(runner.was_started(task), "{task} should still run when {failing} fails");
        }
    }
}

#[tokio::test]
async fn watch_rebuild_runs_build_then_pack() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let runner = FakeActionRunner::new();
    let exec = executor_with(&cfg, runner.clone());

    with_timeout(exec.run(WATCH_REBUILD_TASK)).await.unwrap();

    assert!(finished(&runner, BUILD_ASSETS_TASK) < started(&runner, PACK_TASK));
    assert!(!runner.was_started(WEBSERVER_TASK));
}

#[tokio::test]
async fn watch_starts_server_alongside_rebuild() {
    init_tracing();
    let cfg = ConfigFileBuilder::new().build();
    let runner = FakeActionRunner::new().default_delay(Duration::from_millis(10));
    let exec = executor_with(&cfg, runner.clone());

    with_timeout(exec.run(WATCH_TASK)).await.unwrap();

    assert!(started(&runner, WEBSERVER_TASK) < finished(&runner, PACK_TASK));
}

#[tokio::test]
async fn custom_series_aborts_after_failure() {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_task("lint", TaskConfigBuilder::cmd("eslint src").build())
        .with_task("release", TaskConfigBuilder::series(&["lint", "build", "pack"]).build())
        .build();
    let runner = FakeActionRunner::new().failing("lint");
    let exec = executor_with(&cfg, runner.clone());

    let err = with_timeout(exec.run("release")).await.unwrap_err();

    assert_eq!(err.failed_task(), Some("lint"));
    assert_eq!(runner.started(), vec!["lint".to_string()]);
}

#[tokio::test]
async fn leaf_errors_keep_their_cause() {
    let cfg = ConfigFileBuilder::new().build();
    let exec = executor_with(&cfg, FakeActionRunner::new().failing(PACK_TASK));

    match exec.run(PACK_TASK).await.unwrap_err() {
        PipedagError::TaskError { task, source } => {
            assert_eq!(task, PACK_TASK);
            assert!(matches!(*source, PipedagError::SubprocessError { .. }));
        }
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn unknown_task_is_reported() {
    let cfg = ConfigFileBuilder::new().build();
    let exec = executor_with(&cfg, FakeActionRunner::new());

    let err = exec.run("deploy").await.unwrap_err();
    assert!(matches!(err, PipedagError::TaskNotFound(name) if name == "deploy"));
}
