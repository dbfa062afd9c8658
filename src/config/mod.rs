// src/config/mod.rs

//! Configuration loading and validation for pipedag.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate worker tables, watch settings and user-defined tasks
//!   (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{
    config_root_dir, load_and_validate, load_from_path, load_from_str, DEFAULT_CONFIG_FILE,
};
pub use model::{
    BuildSection, ConfigFile, CopyGroupConfig, LazyLibsSection, PackSection, PagesSection,
    RawConfigFile, ShadersSection, TaskConfig, WatchSection, WebserverSection, WorkersSection,
};
