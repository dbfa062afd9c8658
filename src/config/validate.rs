// src/config/validate.rs

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::dag::standard::{is_builtin, WATCH_REBUILD_TASK, WATCH_TASK};
use crate::errors::{PipedagError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = PipedagError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_output_dirs(cfg)?;
    validate_worker_bundles(cfg)?;
    validate_lazylibs(cfg)?;
    validate_assets(cfg)?;
    validate_custom_tasks(cfg)?;
    validate_task_dag(cfg)?;
    validate_watch(cfg)?;
    Ok(())
}

fn validate_output_dirs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.build.out_dir.trim().is_empty() {
        return Err(PipedagError::ConfigError(
            "[build].out_dir must not be empty".to_string(),
        ));
    }
    if cfg.shaders.output.trim().is_empty() {
        return Err(PipedagError::ConfigError(
            "[shaders].output must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_worker_bundles(cfg: &RawConfigFile) -> Result<()> {
    for (name, sources) in cfg.workers.bundles.iter() {
        ensure_plain_name("worker bundle", name)?;
        if sources.is_empty() {
            return Err(PipedagError::ConfigError(format!(
                "worker bundle '{}' has no source files",
                name
            )));
        }
    }
    Ok(())
}

fn validate_lazylibs(cfg: &RawConfigFile) -> Result<()> {
    for (name, dir) in cfg.lazylibs.libs.iter() {
        ensure_plain_name("lazy library", name)?;
        if dir.trim().is_empty() {
            return Err(PipedagError::ConfigError(format!(
                "lazy library '{}' has an empty source directory",
                name
            )));
        }
    }
    Ok(())
}

fn validate_assets(cfg: &RawConfigFile) -> Result<()> {
    for (idx, group) in cfg.assets.iter().enumerate() {
        if group.patterns.is_empty() {
            return Err(PipedagError::ConfigError(format!(
                "[[assets]] entry #{} has no patterns",
                idx + 1
            )));
        }
    }
    Ok(())
}

fn ensure_plain_name(kind: &str, name: &str) -> Result<()> {
    if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(PipedagError::ConfigError(format!(
            "{kind} name '{name}' must be a plain file name"
        )));
    }
    Ok(())
}

fn validate_custom_tasks(cfg: &RawConfigFile) -> Result<()> {
    for (name, task) in cfg.task.iter() {
        if is_builtin(name) {
            return Err(PipedagError::ConfigError(format!(
                "task '{}' shadows a built-in task",
                name
            )));
        }

        let bodies = [
            task.cmd.is_some(),
            task.series.is_some(),
            task.parallel.is_some(),
        ]
        .iter()
        .filter(|set| **set)
        .count();
        if bodies != 1 {
            return Err(PipedagError::ConfigError(format!(
                "task '{}' must set exactly one of `cmd`, `series` or `parallel`",
                name
            )));
        }

        for child in task.children() {
            if child == name {
                return Err(PipedagError::ConfigError(format!(
                    "task '{}' cannot reference itself",
                    name
                )));
            }
            if !is_builtin(child) && !cfg.task.contains_key(child) {
                return Err(PipedagError::ConfigError(format!(
                    "task '{}' references unknown task '{}'",
                    name, child
                )));
            }
            if child == WATCH_TASK || child == WATCH_REBUILD_TASK {
                return Err(PipedagError::ConfigError(format!(
                    "task '{}' cannot compose `{}`",
                    name, child
                )));
            }
        }
    }
    Ok(())
}

/// Detect cycles among user-defined tasks.
///
/// Edge direction: child -> parent, so a topological order lists children
/// before the tasks composing them.
fn validate_task_dag(cfg: &RawConfigFile) -> Result<()> {
    custom_task_order(cfg).map(|_| ())
}

/// User-defined task names ordered so that every task comes after the custom
/// tasks it references.
pub(crate) fn custom_task_order(cfg: &RawConfigFile) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for name in cfg.task.keys() {
        graph.add_node(name.as_str());
    }

    for (name, task) in cfg.task.iter() {
        for child in task.children() {
            if cfg.task.contains_key(child) {
                graph.add_edge(child.as_str(), name.as_str(), ());
            }
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(PipedagError::TaskCycle(format!(
            "cycle detected in task graph involving task '{}'",
            cycle.node_id()
        ))),
    }
}

fn validate_watch(cfg: &RawConfigFile) -> Result<()> {
    let watch = &cfg.watch;

    if watch.queue_length == 0 {
        return Err(PipedagError::ConfigError(
            "[watch].queue_length must be >= 1 (got 0)".to_string(),
        ));
    }

    if watch.tasks.is_empty() {
        return Err(PipedagError::ConfigError(
            "[watch].tasks must name at least one task".to_string(),
        ));
    }

    for task in watch.tasks.iter() {
        if task == WATCH_TASK || task == WATCH_REBUILD_TASK {
            return Err(PipedagError::ConfigError(format!(
                "[watch].tasks cannot contain '{}'",
                task
            )));
        }
        if !is_builtin(task) && !cfg.task.contains_key(task) {
            return Err(PipedagError::ConfigError(format!(
                "[watch].tasks references unknown task '{}'",
                task
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::loader::load_from_str;

    fn validate(toml: &str) -> Result<ConfigFile> {
        ConfigFile::try_from(load_from_str(toml)?)
    }

    #[test]
    fn empty_config_is_valid() {
        let cfg = validate("").unwrap();
        assert_eq!(cfg.build().out_dir, "build/potree");
        assert_eq!(cfg.watch().tasks, vec!["build", "pack"]);
        assert_eq!(cfg.webserver().command(), "python3 -m http.server 1234");
    }

    #[test]
    fn empty_worker_bundle_is_rejected() {
        let err = validate("[workers.bundles]\nW = []\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("'W'")));
    }

    #[test]
    fn bundle_name_with_slash_is_rejected() {
        let err = validate("[workers.bundles]\n\"a/b\" = [\"x.js\"]\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(_)));
    }

    #[test]
    fn zero_queue_length_is_rejected() {
        let err = validate("[watch]\nqueue_length = 0\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("queue_length")));
    }

    #[test]
    fn unknown_behaviour_fails_to_parse() {
        let err = validate("[watch]\ntriggered_while_running_behaviour = \"later\"\n").unwrap_err();
        assert!(matches!(err, PipedagError::TomlError(_)));
    }

    #[test]
    fn custom_task_needs_exactly_one_body() {
        let err = validate("[task.x]\ncmd = \"echo\"\nseries = [\"build\"]\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("exactly one")));

        let err = validate("[task.x]\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(_)));
    }

    #[test]
    fn custom_task_cannot_shadow_builtin() {
        let err = validate("[task.build]\ncmd = \"make\"\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("built-in")));
    }

    #[test]
    fn custom_cycle_is_detected() {
        let err = validate(
            "[task.a]\nseries = [\"b\"]\n\n[task.b]\nparallel = [\"a\"]\n",
        )
        .unwrap_err();
        assert!(matches!(err, PipedagError::TaskCycle(msg) if msg.contains("cycle detected")));
    }

    #[test]
    fn custom_order_lists_children_first() {
        let raw = load_from_str(
            "[task.release]\nseries = [\"lint\", \"build\"]\n\n[task.lint]\ncmd = \"eslint src\"\n",
        )
        .unwrap();
        let order = custom_task_order(&raw).unwrap();
        let lint = order.iter().position(|n| n == "lint").unwrap();
        let release = order.iter().position(|n| n == "release").unwrap();
        assert!(lint < release);
    }

    #[test]
    fn watch_tasks_must_exist_and_not_recurse() {
        let err = validate("[watch]\ntasks = [\"nope\"]\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("nope")));

        let err = validate("[watch]\ntasks = [\"watch\"]\n").unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(_)));
    }
}
