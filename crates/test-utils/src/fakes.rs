use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use modeljob::engine::{CommandSink, LifecycleCommand};
use modeljob::errors::{ModeljobError, Result};
use modeljob::exec::ExecutableHandler;
use modeljob::gc::{CleanupPhase, MetadataCleaner};
use modeljob::metadata::{MetadataStore, ProjectMetadata};
use modeljob::types::RealizationStatus;

/// Handler that counts how often it was invoked and can be told to fail.
#[derive(Debug, Default)]
pub struct RecordingHandler {
    calls: AtomicUsize,
    fail: bool,
}

impl RecordingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ExecutableHandler for RecordingHandler {
    fn handle_discard_or_suicidal(&self) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(ModeljobError::InvariantViolation(
                "recording handler told to fail".to_string(),
            ));
        }
        Ok(())
    }
}

/// Sink that records every delivered command.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    delivered: Arc<Mutex<Vec<LifecycleCommand>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn delivered(&self) -> Vec<LifecycleCommand> {
        self.delivered.lock().unwrap().clone()
    }
}

impl CommandSink for RecordingSink {
    fn deliver(
        &mut self,
        commands: Vec<LifecycleCommand>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        let delivered = Arc::clone(&self.delivered);
        Box::pin(async move {
            delivered.lock().unwrap().extend(commands);
            Ok(())
        })
    }
}

/// Cleaner that mutates metadata in every phase and fails in `fail_at`
/// after mutating.
///
/// - before_cleanup: every dataflow goes offline.
/// - cleanup: every index plan loses its layouts.
/// - after_cleanup: every dataflow is dropped.
#[derive(Debug)]
pub struct FailingCleaner {
    project: String,
    fail_at: CleanupPhase,
}

impl FailingCleaner {
    pub fn new(project: &str, fail_at: CleanupPhase) -> Self {
        Self {
            project: project.to_string(),
            fail_at,
        }
    }

    fn finish(&self, phase: CleanupPhase) -> Result<()> {
        if phase == self.fail_at {
            return Err(ModeljobError::InvariantViolation(format!(
                "failing cleaner told to fail during {phase}"
            )));
        }
        Ok(())
    }
}

impl MetadataCleaner for FailingCleaner {
    fn project(&self) -> &str {
        &self.project
    }

    fn name(&self) -> &'static str {
        "failing"
    }

    fn prepare(&mut self, _store: &dyn MetadataStore) -> Result<()> {
        self.finish(CleanupPhase::Prepare)
    }

    fn before_cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()> {
        for dataflow in meta.dataflows.values_mut() {
            dataflow.status = RealizationStatus::Offline;
        }
        self.finish(CleanupPhase::BeforeCleanup)
    }

    fn cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()> {
        for plan in meta.index_plans.values_mut() {
            plan.layouts.clear();
        }
        self.finish(CleanupPhase::Cleanup)
    }

    fn after_cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()> {
        meta.dataflows.clear();
        self.finish(CleanupPhase::AfterCleanup)
    }
}
