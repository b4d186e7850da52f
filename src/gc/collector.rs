// src/gc/collector.rs

//! Drives metadata cleaners through their phases.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::{ModeljobError, Result};
use crate::gc::cleaner::{CleanupPhase, MetadataCleaner};
use crate::metadata::MetadataStore;

/// Outcome of a completed sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Cleaners that went through every phase, in run order.
    pub cleaners: Vec<String>,
    /// Number of committed phase transactions.
    pub committed_transactions: usize,
}

/// Runs cleaners phase by phase.
///
/// Every cleaner is prepared first, then every `before_cleanup` runs, then
/// every `cleanup`, then every `after_cleanup`. Each of those phase calls is
/// its own transaction on the cleaner's project. The first failure stops
/// the sweep; phases already committed stay committed.
#[derive(Debug, Clone)]
pub struct GarbageCollector {
    store: Arc<dyn MetadataStore>,
}

impl GarbageCollector {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    pub fn sweep(&self, cleaners: &mut [Box<dyn MetadataCleaner>]) -> Result<SweepReport> {
        let mut report = SweepReport::default();

        for cleaner in cleaners.iter_mut() {
            debug!(cleaner = cleaner.name(), project = %cleaner.project(), "preparing cleaner");
            cleaner
                .prepare(self.store.as_ref())
                .map_err(|e| phase_failed(cleaner.as_ref(), CleanupPhase::Prepare, e))?;
        }

        for phase in [
            CleanupPhase::BeforeCleanup,
            CleanupPhase::Cleanup,
            CleanupPhase::AfterCleanup,
        ] {
            for cleaner in cleaners.iter_mut() {
                self.run_phase(cleaner.as_mut(), phase)?;
                report.committed_transactions += 1;
            }
        }

        report.cleaners = cleaners.iter().map(|c| c.name().to_string()).collect();
        info!(
            cleaners = ?report.cleaners,
            transactions = report.committed_transactions,
            "metadata sweep finished"
        );
        Ok(report)
    }

    fn run_phase(&self, cleaner: &mut dyn MetadataCleaner, phase: CleanupPhase) -> Result<()> {
        let project = cleaner.project().to_string();
        debug!(cleaner = cleaner.name(), project = %project, %phase, "running cleanup phase");

        let outcome = self.store.transaction(&project, &mut |meta| match phase {
            CleanupPhase::BeforeCleanup => cleaner.before_cleanup(meta),
            CleanupPhase::Cleanup => cleaner.cleanup(meta),
            CleanupPhase::AfterCleanup => cleaner.after_cleanup(meta),
            CleanupPhase::Prepare => Ok(()),
        });

        outcome.map_err(|e| phase_failed(cleaner, phase, e))
    }
}

fn phase_failed(
    cleaner: &dyn MetadataCleaner,
    phase: CleanupPhase,
    source: ModeljobError,
) -> ModeljobError {
    error!(
        cleaner = cleaner.name(),
        project = %cleaner.project(),
        %phase,
        error = %source,
        "cleanup phase failed; transaction aborted"
    );
    ModeljobError::CleanupFailed {
        project: cleaner.project().to_string(),
        phase,
        source: Box::new(source),
    }
}
