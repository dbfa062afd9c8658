// src/engine/mod.rs

//! Watch-loop engine.
//!
//! This module ties together:
//! - the trigger queue (what happens when changes arrive while a rebuild runs)
//! - the main runtime event loop that reacts to:
//!   - file-watch changes (debounced)
//!   - rebuild completion events
//!   - shutdown signals
//!
//! The pure core state machine lives in [`core`]; the async/IO shell is
//! implemented in [`runtime`], and rebuilds are started through a
//! [`launcher::RunLauncher`].

/// Identifier of one rebuild.
pub type RunId = u64;

/// Outcome of a rebuild.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Success,
    Failed,
}

/// Events flowing into the runtime from the watcher, launcher, etc.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    /// A watched path (relative to the project root) changed.
    PathChanged { path: String },
    /// A debounced batch of changes should trigger a rebuild.
    Triggered { paths: Vec<String> },
    /// A rebuild finished.
    RunFinished { run_id: RunId, outcome: RunOutcome },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

pub mod core;
pub mod launcher;
pub mod queue;
pub mod runtime;

pub use crate::types::TriggerWhileRunningBehaviour;
pub use self::core::{CoreCommand, CoreRuntime, CoreStep};
pub use launcher::{RealRunLauncher, RunLauncher};
pub use queue::TriggerQueue;
pub use runtime::Runtime;
