mod common;

use std::io::Write;

use tempfile::NamedTempFile;

use crate::common::builders::{ConfigFileBuilder, TaskConfigBuilder};

use pipedag::config::load_and_validate;
use pipedag::errors::PipedagError;
use pipedag::types::TriggerWhileRunningBehaviour;

fn load(toml: &str) -> Result<pipedag::config::ConfigFile, PipedagError> {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{toml}").unwrap();
    load_and_validate(file.path())
}

#[test]
fn empty_file_uses_defaults() {
    let cfg = load("").unwrap();
    assert_eq!(cfg.build().out_dir, "build/potree");
    assert_eq!(cfg.watch().tasks, vec!["build", "pack"]);
    assert_eq!(cfg.watch().debounce_ms, 200);
    assert_eq!(cfg.webserver().command(), "python3 -m http.server 1234");
    assert_eq!(
        cfg.watch().triggered_while_running_behaviour,
        TriggerWhileRunningBehaviour::Queue
    );
}

#[test]
fn full_file_round_trips_into_sections() {
    let cfg = load(
        r#"
[build]
out_dir = "dist"

[workers.bundles]
LASDecoderWorker = ["src/workers/LASDecoderWorker.js"]

[lazylibs.libs]
geopackage = "libs/geopackage"

[shaders]
files = ["src/materials/shaders/edl.vs"]

[[assets]]
patterns = ["resources/**/*", "!resources/icons/index.html"]
dest = "resources"

[webserver]
port = 8080

[watch]
patterns = ["src/**/*.js"]
triggered_while_running_behaviour = "cancel"
"#,
    )
    .unwrap();

    assert_eq!(cfg.out_dir(), std::path::PathBuf::from("dist"));
    assert_eq!(cfg.workers().bundles.len(), 1);
    assert_eq!(cfg.lazylibs().libs["geopackage"], "libs/geopackage");
    assert_eq!(cfg.assets()[0].dest, "resources");
    assert_eq!(cfg.webserver().command(), "python3 -m http.server 8080");
    assert_eq!(
        cfg.watch().triggered_while_running_behaviour,
        TriggerWhileRunningBehaviour::Cancel
    );
}

#[test]
fn unknown_keys_are_rejected() {
    let err = load("[build]\noutdir = \"x\"\n").unwrap_err();
    assert!(matches!(err, PipedagError::TomlError(_)), "got {err:?}");
}

#[test]
fn missing_file_is_a_config_error() {
    let err = load_and_validate("/definitely/not/here/Pipedag.toml").unwrap_err();
    assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("cannot read config")));
}

#[test]
fn empty_worker_bundle_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_bundle("Empty", &[])
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("no source files")));
}

#[test]
fn zero_queue_length_is_rejected() {
    let err = ConfigFileBuilder::new().queue_length(0).try_build().unwrap_err();
    assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("queue_length")));
}

#[test]
fn unknown_task_reference_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("release", TaskConfigBuilder::series(&["build", "deploy"]).build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("unknown task 'deploy'")));
}

#[test]
fn custom_task_cycle_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("a", TaskConfigBuilder::series(&["b"]).build())
        .with_task("b", TaskConfigBuilder::parallel(&["a"]).build())
        .try_build()
        .unwrap_err();
    match err {
        PipedagError::TaskCycle(msg) => assert!(msg.contains("cycle detected")),
        other => panic!("expected TaskCycle, got {other:?}"),
    }
}

#[test]
fn shadowing_a_builtin_is_rejected() {
    let err = ConfigFileBuilder::new()
        .with_task("build", TaskConfigBuilder::cmd("make").build())
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("built-in")));
}

#[test]
fn watch_tasks_cannot_include_watch() {
    let err = ConfigFileBuilder::new()
        .watch_tasks(&["build", "watch"])
        .try_build()
        .unwrap_err();
    assert!(matches!(err, PipedagError::ConfigError(_)));
}

#[test]
fn invalid_behaviour_string_is_rejected() {
    let err = load("[watch]\ntriggered_while_running_behaviour = \"later\"\n").unwrap_err();
    assert!(matches!(err, PipedagError::TomlError(_)));
}
