// src/exec/mod.rs

//! Executable-on-model semantics.
//!
//! - [`manager`] holds submitted jobs by id and answers execution queries.
//! - [`handler`] defines the discard/suicide handler capability.
//! - [`on_model`] binds a node to the execution manager and metadata store;
//!   the cutting-in admission check lives there.
//! - [`validity`] decides whether a job's targets still exist.
//! - [`hooks`] implements the error, discard and suicide hooks.

pub mod handler;
pub mod hooks;
pub mod manager;
pub mod on_model;
pub mod validity;

pub use handler::{AddSegmentHandler, ExecutableHandler};
pub use manager::{ExecutionManager, InMemoryExecutionManager};
pub use on_model::ExecutableOnModel;
pub use validity::split_and_trim;
