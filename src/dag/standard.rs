// src/dag/standard.rs

//! The built-in asset pipeline.
//!
//! ```text
//! build          = series(build:prepare, build:assets)
//! build:prepare  = parallel(workers, lazylibs, shaders, icons_viewer, examples_page)
//! watch:rebuild  = series([watch].tasks)        (default: build, pack)
//! watch          = parallel(watch:rebuild, webserver)
//! ```
//!
//! User-defined `[task.<name>]` entries are registered after the built-ins
//! they may reference and before the `watch` tasks.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::model::ConfigFile;
use crate::config::validate::custom_task_order;
use crate::dag::graph::TaskGraph;
use crate::dag::task::{Action, CopyGroup, LazyLibrary, Task, WorkerBundle};
use crate::errors::Result;

pub const WORKERS_TASK: &str = "workers";
pub const LAZYLIBS_TASK: &str = "lazylibs";
pub const SHADERS_TASK: &str = "shaders";
pub const ICONS_VIEWER_TASK: &str = "icons_viewer";
pub const EXAMPLES_PAGE_TASK: &str = "examples_page";
pub const BUILD_PREPARE_TASK: &str = "build:prepare";
pub const BUILD_ASSETS_TASK: &str = "build:assets";
pub const BUILD_TASK: &str = "build";
pub const PACK_TASK: &str = "pack";
pub const WEBSERVER_TASK: &str = "webserver";
pub const WATCH_REBUILD_TASK: &str = "watch:rebuild";
pub const WATCH_TASK: &str = "watch";

/// Tasks that must all succeed before `build:assets` runs.
pub const BUILD_PREREQUISITES: [&str; 5] = [
    WORKERS_TASK,
    LAZYLIBS_TASK,
    SHADERS_TASK,
    ICONS_VIEWER_TASK,
    EXAMPLES_PAGE_TASK,
];

pub const BUILTIN_TASKS: [&str; 12] = [
    WORKERS_TASK,
    LAZYLIBS_TASK,
    SHADERS_TASK,
    ICONS_VIEWER_TASK,
    EXAMPLES_PAGE_TASK,
    BUILD_PREPARE_TASK,
    BUILD_ASSETS_TASK,
    BUILD_TASK,
    PACK_TASK,
    WEBSERVER_TASK,
    WATCH_REBUILD_TASK,
    WATCH_TASK,
];

pub fn is_builtin(name: &str) -> bool {
    BUILTIN_TASKS.contains(&name)
}

impl TaskGraph {
    /// Build the full task graph for a validated config.
    pub fn from_config(cfg: &ConfigFile) -> Result<Self> {
        let mut graph = TaskGraph::new();
        let out_dir = cfg.out_dir();

        graph.register(Task::action(WORKERS_TASK, workers_action(cfg, &out_dir)))?;
        graph.register(Task::action(LAZYLIBS_TASK, lazylibs_action(cfg, &out_dir)))?;
        graph.register(Task::action(
            SHADERS_TASK,
            Action::WriteShaderTable {
                files: cfg.shaders().files.clone(),
                output: PathBuf::from(&cfg.shaders().output),
            },
        ))?;
        graph.register(Task::action(
            ICONS_VIEWER_TASK,
            Action::GeneratePages {
                commands: cfg.pages().icons.clone(),
            },
        ))?;
        graph.register(Task::action(
            EXAMPLES_PAGE_TASK,
            Action::GeneratePages {
                commands: cfg.pages().examples.clone(),
            },
        ))?;

        graph.register(Task::parallel(BUILD_PREPARE_TASK, BUILD_PREREQUISITES))?;
        graph.register(Task::action(BUILD_ASSETS_TASK, assets_action(cfg, &out_dir)))?;
        graph.register(Task::series(
            BUILD_TASK,
            [BUILD_PREPARE_TASK, BUILD_ASSETS_TASK],
        ))?;

        graph.register(Task::action(
            PACK_TASK,
            Action::Pack {
                command: cfg.pack().cmd.clone(),
            },
        ))?;
        graph.register(Task::action(
            WEBSERVER_TASK,
            Action::Serve {
                command: cfg.webserver().command(),
            },
        ))?;

        for name in custom_task_order(cfg.raw())? {
            let Some(tc) = cfg.tasks().get(&name) else {
                continue;
            };
            let task = if let Some(command) = &tc.cmd {
                Task::action(
                    name.clone(),
                    Action::Shell {
                        command: command.clone(),
                        allow_failure: tc.allow_failure,
                    },
                )
            } else if let Some(children) = &tc.series {
                Task::series(name.clone(), children.clone())
            } else {
                Task::parallel(name.clone(), tc.parallel.clone().unwrap_or_default())
            };
            debug!(task = %name, "registering user-defined task");
            graph.register(task)?;
        }

        graph.register(Task::series(
            WATCH_REBUILD_TASK,
            cfg.watch().tasks.clone(),
        ))?;
        graph.register(Task::parallel(
            WATCH_TASK,
            [WATCH_REBUILD_TASK, WEBSERVER_TASK],
        ))?;

        Ok(graph)
    }
}

fn workers_action(cfg: &ConfigFile, out_dir: &Path) -> Action {
    let workers = cfg.workers();
    Action::BuildWorkers {
        bundles: workers
            .bundles
            .iter()
            .map(|(name, sources)| WorkerBundle {
                name: name.clone(),
                sources: sources.clone(),
            })
            .collect(),
        assets: workers.assets.clone(),
        out_dir: out_dir.join(&workers.dir),
    }
}

fn lazylibs_action(cfg: &ConfigFile, out_dir: &Path) -> Action {
    let lazylibs = cfg.lazylibs();
    Action::CopyLazyLibs {
        libs: lazylibs
            .libs
            .iter()
            .map(|(name, dir)| LazyLibrary {
                name: name.clone(),
                dir: dir.clone(),
            })
            .collect(),
        out_dir: out_dir.join(&lazylibs.dir),
    }
}

fn assets_action(cfg: &ConfigFile, out_dir: &Path) -> Action {
    Action::CopyAssets {
        groups: cfg
            .assets()
            .iter()
            .map(|group| CopyGroup {
                patterns: group.patterns.clone(),
                dest: if group.dest.is_empty() {
                    out_dir.to_path_buf()
                } else {
                    out_dir.join(&group.dest)
                },
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;
    use crate::dag::task::TaskBody;

    fn graph(toml: &str) -> TaskGraph {
        let cfg = ConfigFile::try_from(load_from_str(toml).unwrap()).unwrap();
        TaskGraph::from_config(&cfg).unwrap()
    }

    #[test]
    fn build_runs_prerequisites_before_asset_copy() {
        let g = graph("");
        assert_eq!(
            g.get(BUILD_TASK).unwrap().body,
            TaskBody::Series(vec![BUILD_PREPARE_TASK.into(), BUILD_ASSETS_TASK.into()])
        );
        assert_eq!(
            g.children_of(BUILD_PREPARE_TASK),
            BUILD_PREREQUISITES.map(String::from).as_slice()
        );
    }

    #[test]
    fn every_builtin_is_registered() {
        let g = graph("");
        for name in BUILTIN_TASKS {
            assert!(g.contains(name), "missing {name}");
        }
    }

    #[test]
    fn worker_and_lazylib_outputs_live_under_out_dir() {
        let g = graph(
            r#"
[build]
out_dir = "dist"

[workers.bundles]
W = ["a.js", "b.js"]

[lazylibs.libs]
geo = "libs/geo/"
"#,
        );

        match &g.get(WORKERS_TASK).unwrap().body {
            TaskBody::Action(Action::BuildWorkers { bundles, out_dir, .. }) => {
                assert_eq!(out_dir, &PathBuf::from("dist/workers"));
                assert_eq!(bundles[0].sources, vec!["a.js", "b.js"]);
                assert_eq!(bundles[0].output_file(), "W.js");
            }
            other => panic!("unexpected body {other:?}"),
        }

        match &g.get(LAZYLIBS_TASK).unwrap().body {
            TaskBody::Action(Action::CopyLazyLibs { libs, out_dir }) => {
                assert_eq!(out_dir, &PathBuf::from("dist/lazylibs"));
                assert_eq!(libs[0].pattern(), "libs/geo/**/*");
            }
            other => panic!("unexpected body {other:?}"),
        }
    }

    #[test]
    fn custom_tasks_can_compose_builtins() {
        let g = graph(
            r#"
[task.lint]
cmd = "eslint src"

[task.release]
series = ["lint", "build", "pack"]

[watch]
tasks = ["release"]
"#,
        );
        assert_eq!(g.children_of("release"), &["lint", "build", "pack"].map(String::from));
        assert_eq!(g.children_of(WATCH_REBUILD_TASK), &["release".to_string()]);
    }
}
