// src/transform/shader.rs

//! Generated shader lookup module.
//!
//! The output is a small ES module:
//!
//! ```js
//! let Shaders = {};
//!
//! Shaders["edl.vs"] = `...`
//!
//! export {Shaders};
//! ```

use std::collections::HashSet;
use std::path::Path;

use tracing::debug;

use crate::errors::{PipedagError, Result};
use crate::fileset::FileSet;
use crate::fs::FileSystem;

const TABLE_NAME: &str = "Shaders";

/// Escape text for use inside a JS template literal.
pub fn escape_template_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

/// Render the module for `(name, content)` pairs, in order.
pub fn render_shader_table<N: AsRef<str>, C: AsRef<str>>(entries: &[(N, C)]) -> String {
    let mut components = Vec::with_capacity(entries.len() + 2);
    components.push(format!("let {TABLE_NAME} = {{}};"));

    for (name, content) in entries {
        components.push(format!(
            "{TABLE_NAME}[\"{}\"] = `{}`",
            escape_key(name.as_ref()),
            escape_template_literal(content.as_ref())
        ));
    }

    components.push(format!("export {{{TABLE_NAME}}};"));
    components.join("\n\n")
}

fn escape_key(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Read every shader in `files` and write the generated module to `target`.
///
/// Keys are file base names; two files sharing a base name are rejected.
/// Returns the number of entries written.
pub fn write_shader_table(fs: &dyn FileSystem, files: &FileSet, target: &Path) -> Result<usize> {
    let mut entries: Vec<(String, String)> = Vec::with_capacity(files.len());
    let mut names: HashSet<String> = HashSet::new();

    for path in files.paths() {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| PipedagError::read(path, "shader path has no file name"))?;

        if !names.insert(name.clone()) {
            return Err(PipedagError::ConfigError(format!(
                "duplicate shader name '{name}' ({})",
                path.display()
            )));
        }

        let bytes = fs
            .read(path)
            .map_err(|e| PipedagError::read(path, format!("{e:#}")))?;
        let content = String::from_utf8(bytes)
            .map_err(|e| PipedagError::read(path, format!("not valid UTF-8: {e}")))?;

        entries.push((name, content));
    }

    if let Some(parent) = target.parent() {
        fs.create_dir_all(parent)
            .map_err(|e| PipedagError::write(parent, format!("{e:#}")))?;
    }

    let module = render_shader_table(&entries);
    fs.write(target, module.as_bytes())
        .map_err(|e| PipedagError::write(target, format!("{e:#}")))?;

    debug!(target = ?target, shaders = entries.len(), "wrote shader table");
    Ok(entries.len())
}
