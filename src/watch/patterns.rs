// src/watch/patterns.rs

use std::fmt;

use globset::GlobSet;

use crate::dag::TaskName;
use crate::errors::Result;
use crate::fileset::{build_globset, PatternSpec};

/// Compiled `[watch]` patterns and the task re-run when one matches.
///
/// Patterns are relative to the project root; the watcher passes relative
/// paths (e.g. `"src/viewer/viewer.js"`) into [`WatchRule::matches`].
#[derive(Clone)]
pub struct WatchRule {
    task: TaskName,
    patterns: Vec<String>,
    include: Option<GlobSet>,
    exclude: Option<GlobSet>,
}

impl fmt::Debug for WatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchRule")
            .field("task", &self.task)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl WatchRule {
    /// Split `!` exclusions from inclusions and compile both.
    pub fn compile<S: AsRef<str>>(task: impl Into<TaskName>, patterns: &[S]) -> Result<Self> {
        let specs: Vec<PatternSpec> = patterns
            .iter()
            .map(|p| PatternSpec::parse(p.as_ref()))
            .collect();

        Ok(Self {
            task: task.into(),
            patterns: patterns.iter().map(|p| p.as_ref().to_string()).collect(),
            include: build_globset(&globs(&specs, false))?,
            exclude: build_globset(&globs(&specs, true))?,
        })
    }

    pub fn task(&self) -> &str {
        &self.task
    }

    /// True if no inclusion pattern is configured; such a rule never matches.
    pub fn is_empty(&self) -> bool {
        self.include.is_none()
    }

    /// Exclusions are evaluated first: an excluded path never matches, even
    /// if an inclusion covers it.
    pub fn matches(&self, rel_path: &str) -> bool {
        if self.exclude.as_ref().is_some_and(|set| set.is_match(rel_path)) {
            return false;
        }
        self.include.as_ref().is_some_and(|set| set.is_match(rel_path))
    }
}

fn globs(specs: &[PatternSpec], negated: bool) -> Vec<&str> {
    specs
        .iter()
        .filter(|s| s.negated == negated)
        .map(|s| s.glob.as_str())
        .collect()
}
