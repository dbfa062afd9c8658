// src/dag/task.rs

//! Task definitions: primitive actions and their compositions.

use std::path::PathBuf;

/// Canonical task name type.
pub type TaskName = String;

/// A named group of source fragments concatenated, in declaration order,
/// into `<name>.js`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerBundle {
    pub name: String,
    pub sources: Vec<String>,
}

impl WorkerBundle {
    pub fn output_file(&self) -> String {
        format!("{}.js", self.name)
    }
}

/// A library directory copied wholesale into `<lazylibs dir>/<name>/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyLibrary {
    pub name: String,
    pub dir: String,
}

impl LazyLibrary {
    /// Pattern selecting everything below the library directory.
    pub fn pattern(&self) -> String {
        format!("{}/**/*", self.dir.trim_end_matches('/'))
    }
}

/// Patterns copied into one destination directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyGroup {
    pub patterns: Vec<String>,
    pub dest: PathBuf,
}

/// A primitive unit of work. Paths are relative to the project root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Concatenate every bundle and copy the extra worker assets.
    BuildWorkers {
        bundles: Vec<WorkerBundle>,
        assets: Vec<String>,
        out_dir: PathBuf,
    },
    /// Copy each library tree.
    CopyLazyLibs {
        libs: Vec<LazyLibrary>,
        out_dir: PathBuf,
    },
    /// Generate the shader lookup module.
    WriteShaderTable { files: Vec<String>, output: PathBuf },
    /// Copy asset groups in order.
    CopyAssets { groups: Vec<CopyGroup> },
    /// Run page generators concurrently; any failure fails the action.
    GeneratePages { commands: Vec<String> },
    /// Run the bundler. Its failure is reported, never raised.
    Pack { command: String },
    /// Start the dev server without waiting for it.
    Serve { command: String },
    /// User-defined shell command.
    Shell {
        command: String,
        allow_failure: bool,
    },
}

impl Action {
    /// Short label for logs and dry-run output.
    pub fn describe(&self) -> String {
        match self {
            Action::BuildWorkers { bundles, assets, .. } => {
                format!("concat {} worker bundle(s), copy {} asset(s)", bundles.len(), assets.len())
            }
            Action::CopyLazyLibs { libs, .. } => format!("copy {} lazy library tree(s)", libs.len()),
            Action::WriteShaderTable { files, output } => {
                format!("inline {} shader(s) into {}", files.len(), output.display())
            }
            Action::CopyAssets { groups } => format!("copy {} asset group(s)", groups.len()),
            Action::GeneratePages { commands } => format!("generate pages: {:?}", commands),
            Action::Pack { command } => format!("pack: {command}"),
            Action::Serve { command } => format!("serve: {command}"),
            Action::Shell { command, .. } => format!("run: {command}"),
        }
    }
}

/// Body of a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskBody {
    Action(Action),
    /// Children run in listed order, each after the previous succeeded.
    Series(Vec<TaskName>),
    /// Children run concurrently.
    Parallel(Vec<TaskName>),
}

/// A named, invokable unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub name: TaskName,
    pub body: TaskBody,
}

impl Task {
    pub fn action(name: impl Into<TaskName>, action: Action) -> Self {
        Self {
            name: name.into(),
            body: TaskBody::Action(action),
        }
    }

    pub fn series<I, S>(name: impl Into<TaskName>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            name: name.into(),
            body: TaskBody::Series(children.into_iter().map(Into::into).collect()),
        }
    }

    pub fn parallel<I, S>(name: impl Into<TaskName>, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<TaskName>,
    {
        Self {
            name: name.into(),
            body: TaskBody::Parallel(children.into_iter().map(Into::into).collect()),
        }
    }

    /// Child task names (empty for actions).
    pub fn children(&self) -> &[TaskName] {
        match &self.body {
            TaskBody::Action(_) => &[],
            TaskBody::Series(children) | TaskBody::Parallel(children) => children,
        }
    }
}
