// src/watch/mod.rs

//! File watching.
//!
//! This module is responsible for:
//! - Compiling the `[watch]` include / `!` exclude patterns into a rule.
//! - Coalescing bursts of changes inside a quiet window.
//! - Wiring up a cross-platform filesystem watcher (`notify`).
//!
//! It does **not** know about the task graph; it only turns filesystem
//! changes into runtime events.

pub mod debounce;
pub mod path_utils;
pub mod patterns;
pub mod watcher;

pub use debounce::Debouncer;
pub use patterns::WatchRule;
pub use watcher::{spawn_watcher, WatcherHandle};
