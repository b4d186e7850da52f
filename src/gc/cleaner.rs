// src/gc/cleaner.rs

use std::fmt::{self, Debug};

use crate::errors::Result;
use crate::metadata::{MetadataStore, ProjectMetadata};

/// Phases of a metadata cleaner, in the order the collector runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupPhase {
    Prepare,
    BeforeCleanup,
    Cleanup,
    AfterCleanup,
}

impl fmt::Display for CleanupPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CleanupPhase::Prepare => "prepare",
            CleanupPhase::BeforeCleanup => "before_cleanup",
            CleanupPhase::Cleanup => "cleanup",
            CleanupPhase::AfterCleanup => "after_cleanup",
        };
        f.write_str(s)
    }
}

/// A unit of metadata garbage collection scoped to exactly one project.
///
/// `before_cleanup`, `cleanup` and `after_cleanup` each run inside their own
/// metadata transaction opened by the collector; they receive the
/// transaction's working copy and must not touch the store directly. An
/// error from any of them rolls that transaction back.
pub trait MetadataCleaner: Send + Debug {
    /// Project this cleaner is scoped to.
    fn project(&self) -> &str;

    /// Short name used in logs and sweep reports.
    fn name(&self) -> &'static str;

    /// Optional pre-flight, outside any transaction.
    fn prepare(&mut self, _store: &dyn MetadataStore) -> Result<()> {
        Ok(())
    }

    fn before_cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()>;

    fn cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()>;

    fn after_cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()>;
}
