// src/config/mod.rs

//! Configuration loading and validation.
//!
//! - `model.rs`: the TOML-backed data model and its conversions into
//!   metadata, job nodes and lifecycle events.
//! - `loader.rs`: reading a config file from disk.
//! - `validate.rs`: cross-reference checks between models, jobs and events.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{
    ConfigFile, ConfigSection, EventConfig, EventKind, JobConfig, ModelConfig, RawConfigFile,
    SegmentConfig,
};
