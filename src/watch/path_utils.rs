// src/watch/path_utils.rs

use std::path::Path;

/// Convert a path into a string relative to `root`, with forward slashes.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (symlinks, `/private/var` on macOS), we canonicalize both
///   paths and try again. A deleted file cannot be canonicalized, so its
///   parent is used instead.
///
/// Returns `None` if the path is not below `root`.
pub fn relative_str(root: &Path, path: &Path) -> Option<String> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(to_forward_slashes(rel));
    }

    let root_canon = root.canonicalize().ok()?;
    let path_canon = match path.canonicalize() {
        Ok(p) => p,
        Err(_) => {
            let parent = path.parent()?.canonicalize().ok()?;
            parent.join(path.file_name()?)
        }
    };

    path_canon
        .strip_prefix(&root_canon)
        .ok()
        .map(to_forward_slashes)
}

fn to_forward_slashes(rel: &Path) -> String {
    rel.to_string_lossy().replace('\\', "/")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        assert_eq!(
            relative_str(Path::new("/proj"), Path::new("/proj/src/a.js")).as_deref(),
            Some("src/a.js")
        );
    }

    #[test]
    fn outside_root_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let file = other.path().join("x.js");
        std::fs::write(&file, "").unwrap();
        assert_eq!(relative_str(dir.path(), &file), None);
    }

    #[test]
    fn deleted_file_under_canonical_root() {
        let dir = tempfile::tempdir().unwrap();
        let canon = dir.path().canonicalize().unwrap();
        let gone = canon.join("gone.js");
        assert_eq!(relative_str(dir.path(), &gone).as_deref(), Some("gone.js"));
    }
}
