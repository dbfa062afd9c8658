// src/transform/copy.rs

use std::path::Path;

use tracing::{debug, trace};

use crate::errors::{PipedagError, Result};
use crate::fileset::{join_under, FileSet};
use crate::fs::FileSystem;

/// Copy every entry of `set` to `dest/<entry.relative>`.
///
/// Intermediate directories are created and existing files overwritten.
/// Returns the number of files copied.
pub fn copy_file_set(fs: &dyn FileSystem, set: &FileSet, dest: &Path) -> Result<usize> {
    let mut copied = 0;

    for entry in set {
        if !fs.is_file(&entry.path) {
            return Err(PipedagError::read(&entry.path, "no such file"));
        }

        let target = join_under(dest, &entry.relative);
        if let Some(parent) = target.parent() {
            fs.create_dir_all(parent)
                .map_err(|e| PipedagError::write(parent, format!("{e:#}")))?;
        }

        fs.copy(&entry.path, &target)
            .map_err(|e| PipedagError::write(&target, format!("{e:#}")))?;
        trace!(from = ?entry.path, to = ?target, "copied");
        copied += 1;
    }

    debug!(dest = ?dest, copied, "copy complete");
    Ok(copied)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fileset::resolve;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn preserves_structure_below_pattern_base() {
        let fs = MockFileSystem::new();
        fs.add_file("/p/libs/geo/geo.js", "g");
        fs.add_file("/p/libs/geo/sub/worker.js", "w");

        let set = resolve(&fs, Path::new("/p"), &["libs/geo/**/*"]).unwrap();
        let n = copy_file_set(&fs, &set, Path::new("/p/build/lazylibs/geo")).unwrap();

        assert_eq!(n, 2);
        assert_eq!(fs.contents("/p/build/lazylibs/geo/geo.js").as_deref(), Some("g"));
        assert_eq!(
            fs.contents("/p/build/lazylibs/geo/sub/worker.js").as_deref(),
            Some("w")
        );
    }

    #[test]
    fn missing_literal_is_a_read_error() {
        let fs = MockFileSystem::new();
        let set = FileSet::from_literals(Path::new("/p"), &["libs/copc/laz-perf.wasm"]);

        let err = copy_file_set(&fs, &set, Path::new("/p/build/workers")).unwrap_err();
        assert!(matches!(err, PipedagError::ReadError { .. }));
    }

    #[test]
    fn empty_set_copies_nothing() {
        let fs = MockFileSystem::new();
        let n = copy_file_set(&fs, &FileSet::new(), Path::new("/p/out")).unwrap();
        assert_eq!(n, 0);
        assert!(fs.files_under("/p/out").is_empty());
    }
}
