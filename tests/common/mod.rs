#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

pub use pipedag_test_utils::builders;
pub use pipedag_test_utils::fake_launcher;
pub use pipedag_test_utils::fake_runner;
pub use pipedag_test_utils::{init_tracing, with_timeout};

use pipedag::config::ConfigFile;
use pipedag::dag::{ActionRunner, Executor, TaskGraph};

/// Executor over the standard graph for `cfg`, with a fake action runner.
pub fn executor_with(cfg: &ConfigFile, runner: impl ActionRunner + 'static) -> Executor {
    let graph = TaskGraph::from_config(cfg).expect("graph from config");
    Executor::new(Arc::new(graph), Arc::new(runner))
}

/// Write a fixture file, creating parent directories.
pub fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, contents).unwrap();
}

pub fn read(root: &Path, rel: &str) -> String {
    std::fs::read_to_string(root.join(rel))
        .unwrap_or_else(|e| panic!("reading {rel}: {e}"))
}

/// All files below `root/rel`, relative to `root/rel`, sorted, with `/`.
pub fn tree(root: &Path, rel: &str) -> Vec<String> {
    fn walk(base: &Path, dir: &Path, out: &mut Vec<String>) {
        let Ok(entries) = std::fs::read_dir(dir) else {
            return;
        };
        for entry in entries {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(base, &path, out);
            } else {
                let rel = path.strip_prefix(base).unwrap();
                out.push(rel.to_string_lossy().replace('\\', "/"));
            }
        }
    }

    let base = root.join(rel);
    let mut out = Vec::new();
    walk(&base, &base, &mut out);
    out.sort();
    out
}
