// src/gc/mod.rs

//! Transactional metadata garbage collection.
//!
//! - [`cleaner`] defines the three-phase [`MetadataCleaner`] unit.
//! - [`collector`] runs cleaners phase by phase, one transaction per call.
//! - [`index_cleaner`] drops tombstoned layouts.

pub mod cleaner;
pub mod collector;
pub mod index_cleaner;

pub use cleaner::{CleanupPhase, MetadataCleaner};
pub use collector::{GarbageCollector, SweepReport};
pub use index_cleaner::IndexCleaner;
