// src/dag/mod.rs

//! Task graph and executor.
//!
//! - [`task`] defines primitive actions and series/parallel compositions.
//! - [`graph`] is the explicit task registry.
//! - [`standard`] builds the built-in asset pipeline from a config.
//! - [`executor`] runs a task and everything below it.

pub mod executor;
pub mod graph;
pub mod standard;
pub mod task;

pub use executor::{ActionRunner, BoxFuture, Executor};
pub use graph::TaskGraph;
pub use task::{Action, CopyGroup, LazyLibrary, Task, TaskBody, TaskName, WorkerBundle};
