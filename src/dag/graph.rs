// src/dag/graph.rs

use std::collections::HashMap;

use crate::dag::task::{Task, TaskBody, TaskName};
use crate::errors::{PipedagError, Result};

/// Explicit registry of tasks, passed to the executor.
///
/// A task may only reference tasks registered before it, so the graph is
/// acyclic by construction.
#[derive(Debug, Clone, Default)]
pub struct TaskGraph {
    tasks: HashMap<TaskName, Task>,
    /// Registration order, for listing.
    order: Vec<TaskName>,
}

impl TaskGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a task. Fails on duplicate names and on children that have not been
    /// registered yet.
    pub fn register(&mut self, task: Task) -> Result<()> {
        if self.tasks.contains_key(&task.name) {
            return Err(PipedagError::ConfigError(format!(
                "task '{}' registered twice",
                task.name
            )));
        }

        for child in task.children() {
            if child == &task.name {
                return Err(PipedagError::ConfigError(format!(
                    "task '{}' cannot reference itself",
                    task.name
                )));
            }
            if !self.tasks.contains_key(child) {
                return Err(PipedagError::ConfigError(format!(
                    "task '{}' references '{}' which is not registered yet",
                    task.name, child
                )));
            }
        }

        self.order.push(task.name.clone());
        self.tasks.insert(task.name.clone(), task);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Task> {
        self.tasks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tasks.contains_key(name)
    }

    /// Task names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Immediate children of a task (empty for actions and unknown names).
    pub fn children_of(&self, name: &str) -> &[TaskName] {
        self.tasks.get(name).map(Task::children).unwrap_or(&[])
    }

    /// Indented tree of `name` and everything below it.
    pub fn describe(&self, name: &str) -> Result<Vec<String>> {
        if !self.contains(name) {
            return Err(PipedagError::TaskNotFound(name.to_string()));
        }
        let mut lines = Vec::new();
        self.describe_into(name, 0, &mut lines);
        Ok(lines)
    }

    fn describe_into(&self, name: &str, depth: usize, lines: &mut Vec<String>) {
        let indent = "  ".repeat(depth);
        let Some(task) = self.tasks.get(name) else {
            return;
        };
        match &task.body {
            TaskBody::Action(action) => {
                lines.push(format!("{indent}- {name}: {}", action.describe()));
            }
            TaskBody::Series(children) => {
                lines.push(format!("{indent}- {name} (series)"));
                for child in children {
                    self.describe_into(child, depth + 1, lines);
                }
            }
            TaskBody::Parallel(children) => {
                lines.push(format!("{indent}- {name} (parallel)"));
                for child in children {
                    self.describe_into(child, depth + 1, lines);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dag::task::Action;

    fn leaf(name: &str) -> Task {
        Task::action(
            name,
            Action::Shell {
                command: format!("echo {name}"),
                allow_failure: false,
            },
        )
    }

    #[test]
    fn children_must_be_registered_first() {
        let mut graph = TaskGraph::new();
        let err = graph.register(Task::series("all", ["a"])).unwrap_err();
        assert!(matches!(err, PipedagError::ConfigError(msg) if msg.contains("not registered")));

        graph.register(leaf("a")).unwrap();
        graph.register(Task::series("all", ["a"])).unwrap();
        assert_eq!(graph.children_of("all"), &["a".to_string()]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut graph = TaskGraph::new();
        graph.register(leaf("a")).unwrap();
        assert!(graph.register(leaf("a")).is_err());
    }

    #[test]
    fn describe_renders_tree() {
        let mut graph = TaskGraph::new();
        graph.register(leaf("a")).unwrap();
        graph.register(leaf("b")).unwrap();
        graph.register(Task::parallel("ab", ["a", "b"])).unwrap();

        let lines = graph.describe("ab").unwrap();
        assert_eq!(
            lines,
            vec![
                "- ab (parallel)".to_string(),
                "  - a: run: echo a".to_string(),
                "  - b: run: echo b".to_string(),
            ]
        );
        assert!(matches!(graph.describe("zz"), Err(PipedagError::TaskNotFound(_))));
    }
}
