// src/fileset/mod.rs

//! Expanding path specifications into ordered file lists.
//!
//! - [`pattern`] parses individual patterns (negation, literal prefix) and
//!   compiles them with `globset`.
//! - [`resolver`] walks the filesystem and produces a [`FileSet`].

pub mod pattern;
pub mod resolver;

use std::path::{Path, PathBuf};

pub use pattern::{build_globset, compile_glob, PatternSpec};
pub use resolver::resolve;

/// One resolved file.
///
/// `base` is the directory the pattern was rooted at (its literal prefix);
/// `relative` is the file's path below `base`. Copies recreate `relative`
/// under the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub path: PathBuf,
    pub base: PathBuf,
    pub relative: PathBuf,
}

/// Ordered list of resolved files.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSet {
    entries: Vec<FileEntry>,
}

impl FileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set from literal paths (relative to `root`) without checking
    /// that they exist.
    ///
    /// Used for inputs that are required rather than optional: the consumer
    /// reports a read error for anything missing.
    pub fn from_literals<S: AsRef<str>>(root: &Path, paths: &[S]) -> Self {
        let entries = paths
            .iter()
            .map(|p| {
                let normalized = pattern::normalize(p.as_ref());
                let path = join_under(root, Path::new(&normalized));
                let base = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| root.to_path_buf());
                let relative = path
                    .file_name()
                    .map(PathBuf::from)
                    .unwrap_or_else(|| PathBuf::from(&normalized));
                FileEntry {
                    path,
                    base,
                    relative,
                }
            })
            .collect();
        Self { entries }
    }

    pub fn push(&mut self, entry: FileEntry) {
        self.entries.push(entry);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileEntry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|e| e.path.as_path())
    }
}

impl<'a> IntoIterator for &'a FileSet {
    type Item = &'a FileEntry;
    type IntoIter = std::slice::Iter<'a, FileEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// `root.join(rel)` that does not append a trailing separator for an empty
/// `rel`.
pub(crate) fn join_under(root: &Path, rel: &Path) -> PathBuf {
    if rel.as_os_str().is_empty() {
        root.to_path_buf()
    } else {
        root.join(rel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_literals_keeps_declared_order() {
        let set = FileSet::from_literals(Path::new("/p"), &["b/2.js", "./a/1.js"]);
        let paths: Vec<_> = set.paths().map(Path::to_path_buf).collect();
        assert_eq!(
            paths,
            vec![PathBuf::from("/p/b/2.js"), PathBuf::from("/p/a/1.js")]
        );

        let first = set.iter().next().unwrap();
        assert_eq!(first.base, PathBuf::from("/p/b"));
        assert_eq!(first.relative, PathBuf::from("2.js"));
    }
}
