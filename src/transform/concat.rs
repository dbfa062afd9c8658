// src/transform/concat.rs

use std::path::Path;

use tracing::debug;

use crate::errors::{PipedagError, Result};
use crate::fileset::FileSet;
use crate::fs::FileSystem;

/// Read every entry of `set` in order and write the raw bytes joined by
/// `separator` to `output`.
///
/// All inputs are read before anything is written, so a missing input leaves
/// `output` untouched. Returns the number of bytes written.
pub fn concat_file_set(
    fs: &dyn FileSystem,
    set: &FileSet,
    separator: &[u8],
    output: &Path,
) -> Result<usize> {
    let mut joined: Vec<u8> = Vec::new();

    for (idx, path) in set.paths().enumerate() {
        let bytes = fs
            .read(path)
            .map_err(|e| PipedagError::read(path, format!("{e:#}")))?;
        if idx > 0 {
            joined.extend_from_slice(separator);
        }
        joined.extend_from_slice(&bytes);
    }

    fs.write(output, &joined)
        .map_err(|e| PipedagError::write(output, format!("{e:#}")))?;

    debug!(
        output = ?output,
        inputs = set.len(),
        bytes = joined.len(),
        "concatenated"
    );
    Ok(joined.len())
}
