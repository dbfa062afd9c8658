// src/pipeline/mod.rs

//! Production [`ActionRunner`](crate::dag::ActionRunner): file-set transforms
//! on the real filesystem and commands through the process bridge.

pub mod actions;

pub use actions::PipelineActions;
