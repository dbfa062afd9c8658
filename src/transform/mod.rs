// src/transform/mod.rs

//! File-set transforms used by the pipeline actions.
//!
//! All functions are synchronous and go through [`crate::fs::FileSystem`];
//! callers on the async side wrap them in `spawn_blocking`.

pub mod concat;
pub mod copy;
pub mod shader;

pub use concat::concat_file_set;
pub use copy::copy_file_set;
pub use shader::{escape_template_literal, render_shader_table, write_shader_table};
