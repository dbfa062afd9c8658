// src/fileset/resolver.rs

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use globset::GlobSet;
use tracing::{debug, trace};

use crate::errors::{PipedagError, Result};
use crate::fileset::pattern::{build_globset, compile_glob, PatternSpec};
use crate::fileset::{join_under, FileEntry, FileSet};
use crate::fs::FileSystem;

/// Expand `patterns` (relative to `root`) into an ordered [`FileSet`].
///
/// - Inclusion patterns contribute in declared order; within one pattern,
///   files come in depth-first traversal order with names sorted.
/// - `!`-prefixed patterns exclude matches from every inclusion.
/// - A file matched by several patterns is listed once.
/// - Patterns that match nothing contribute nothing; only malformed patterns
///   are errors.
pub fn resolve<S: AsRef<str>>(
    fs: &dyn FileSystem,
    root: &Path,
    patterns: &[S],
) -> Result<FileSet> {
    let specs: Vec<PatternSpec> = patterns
        .iter()
        .map(|p| PatternSpec::parse(p.as_ref()))
        .collect();

    let exclude_globs: Vec<&str> = specs
        .iter()
        .filter(|s| s.negated)
        .map(|s| s.glob.as_str())
        .collect();
    let excludes = build_globset(&exclude_globs)?;

    let mut set = FileSet::new();
    let mut seen: HashSet<PathBuf> = HashSet::new();

    for spec in specs.iter().filter(|s| !s.negated) {
        let matcher = compile_glob(&spec.glob)?;
        let base_dir = join_under(root, &spec.base);

        if spec.literal {
            let path = join_under(root, Path::new(&spec.glob));
            if fs.is_file(&path) && !is_excluded(excludes.as_ref(), &spec.glob) {
                push_unique(&mut set, &mut seen, path, &base_dir);
            } else {
                debug!(pattern = %spec.raw, "literal pattern matched nothing");
            }
            continue;
        }

        if !fs.is_dir(&base_dir) {
            debug!(
                pattern = %spec.raw,
                base = ?base_dir,
                "pattern base directory does not exist; matched nothing"
            );
            continue;
        }

        let before = set.len();
        for path in walk_sorted(fs, &base_dir)? {
            let rel = relative_str(root, &path);
            if is_excluded(excludes.as_ref(), &rel) {
                trace!(path = %rel, "excluded");
                continue;
            }
            if matcher.is_match(&rel) {
                push_unique(&mut set, &mut seen, path, &base_dir);
            }
        }

        debug!(
            pattern = %spec.raw,
            matched = set.len() - before,
            "resolved pattern"
        );
    }

    Ok(set)
}

fn is_excluded(excludes: Option<&GlobSet>, rel: &str) -> bool {
    excludes.is_some_and(|set| set.is_match(rel))
}

fn push_unique(set: &mut FileSet, seen: &mut HashSet<PathBuf>, path: PathBuf, base: &Path) {
    if !seen.insert(path.clone()) {
        return;
    }
    let relative = path
        .strip_prefix(base)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.file_name().map(PathBuf::from).unwrap_or_default());
    set.push(FileEntry {
        path,
        base: base.to_path_buf(),
        relative,
    });
}

/// All files below `dir`, depth-first, entries sorted by name at each level.
/// Symlinked directories are not descended into.
fn walk_sorted(fs: &dyn FileSystem, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    walk_into(fs, dir, &mut files)?;
    Ok(files)
}

fn walk_into(fs: &dyn FileSystem, dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = fs
        .read_dir(dir)
        .map_err(|e| PipedagError::read(dir, format!("{e:#}")))?;
    entries.sort();

    for path in entries {
        if fs.is_dir(&path) {
            if fs.is_symlink(&path) {
                debug!(path = ?path, "not following symlinked directory");
                continue;
            }
            walk_into(fs, &path, files)?;
        } else if fs.is_file(&path) {
            files.push(path);
        }
    }
    Ok(())
}

/// Path of `path` relative to `root` with forward slashes; falls back to the
/// full path if it is not below `root`.
fn relative_str(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.to_string_lossy().replace('\\', "/")
}
