// src/errors.rs

//! Crate-wide error type and result alias.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipedagError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Cycle detected in task graph: {0}")]
    TaskCycle(String),

    #[error("invalid pattern `{pattern}`: {reason}")]
    PatternResolutionError { pattern: String, reason: String },

    #[error("failed to read {}: {reason}", path.display())]
    ReadError { path: PathBuf, reason: String },

    #[error("failed to write {}: {reason}", path.display())]
    WriteError { path: PathBuf, reason: String },

    #[error("command `{command}` failed: {reason}")]
    SubprocessError { command: String, reason: String },

    #[error("task '{task}' failed: {source}")]
    TaskError {
        task: String,
        #[source]
        source: Box<PipedagError>,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl PipedagError {
    pub(crate) fn read(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        PipedagError::ReadError {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn write(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        PipedagError::WriteError {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    /// Name of the leaf task that failed, if this error came out of the executor.
    pub fn failed_task(&self) -> Option<&str> {
        match self {
            PipedagError::TaskError { task, .. } => Some(task),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, PipedagError>;
