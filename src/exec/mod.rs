// src/exec/mod.rs

//! External process bridge.
//!
//! - [`process`] runs one-shot commands through the platform shell and
//!   captures their output.
//! - [`long_lived`] starts servers whose output is streamed to the log.
//! - [`bridge`] ties both to a project root and tracks running servers.

pub mod bridge;
pub mod long_lived;
pub mod process;

pub use bridge::{ProcessBridge, ServerExit};
pub use process::{run_subprocess, ProcessOutput};
