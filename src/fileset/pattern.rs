// src/fileset/pattern.rs

use std::path::PathBuf;

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::errors::{PipedagError, Result};

const GLOB_META: &[char] = &['*', '?', '[', '{'];

/// A single parsed path pattern.
///
/// ```text
/// "resources/**/*"        -> base "resources", glob
/// "!resources/index.html" -> negated, literal
/// "LICENSE"               -> base "", literal
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternSpec {
    /// Pattern as written in the config.
    pub raw: String,
    /// Normalized glob without the `!` prefix.
    pub glob: String,
    pub negated: bool,
    /// Literal directory prefix (relative to the project root).
    pub base: PathBuf,
    /// True if the pattern has no glob metacharacters at all.
    pub literal: bool,
}

impl PatternSpec {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let (negated, body) = match trimmed.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, trimmed),
        };
        let glob = normalize(body);

        let components: Vec<&str> = glob.split('/').collect();
        let first_meta = components.iter().position(|c| c.contains(GLOB_META));

        let (base_components, literal) = match first_meta {
            Some(idx) => (&components[..idx], false),
            None => (&components[..components.len().saturating_sub(1)], true),
        };

        let base: PathBuf = base_components.iter().collect();

        Self {
            raw: raw.to_string(),
            glob,
            negated,
            base,
            literal,
        }
    }
}

/// Normalize separators: backslashes become `/`, repeated slashes collapse
/// and a leading `./` is dropped.
pub fn normalize(pattern: &str) -> String {
    let unified = pattern.replace('\\', "/");
    let mut out = String::with_capacity(unified.len());
    let mut prev_slash = false;
    for ch in unified.chars() {
        if ch == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(ch);
    }

    let mut rest = out.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped;
    }
    rest.to_string()
}

/// Compile one glob. `*` does not cross `/`; `**` does.
pub fn compile_glob(pattern: &str) -> Result<GlobMatcher> {
    let glob = GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| PipedagError::PatternResolutionError {
            pattern: pattern.to_string(),
            reason: e.kind().to_string(),
        })?;
    Ok(glob.compile_matcher())
}

/// Build a GlobSet from normalized patterns. Returns `None` for an empty list.
pub fn build_globset<S: AsRef<str>>(patterns: &[S]) -> Result<Option<GlobSet>> {
    if patterns.is_empty() {
        return Ok(None);
    }

    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        let pat = pat.as_ref();
        let glob = GlobBuilder::new(pat)
            .literal_separator(true)
            .build()
            .map_err(|e| PipedagError::PatternResolutionError {
                pattern: pat.to_string(),
                reason: e.kind().to_string(),
            })?;
        builder.add(glob);
    }

    let set = builder
        .build()
        .map_err(|e| PipedagError::PatternResolutionError {
            pattern: patterns
                .iter()
                .map(|p| p.as_ref())
                .collect::<Vec<_>>()
                .join(", "),
            reason: e.to_string(),
        })?;
    Ok(Some(set))
}
