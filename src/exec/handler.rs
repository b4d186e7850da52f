// src/exec/handler.rs

//! Pluggable cleanup reacting to a job being discarded or committing suicide.

use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

use tracing::info;

use crate::errors::Result;
use crate::metadata::MetadataStore;
use crate::types::SegmentStatus;

/// Capability attached to a job at construction time.
///
/// Discard (an external decision) and suicide (the job's own decision) reach
/// the handler through different hooks but trigger the same cleanup.
pub trait ExecutableHandler: Send + Sync + Debug {
    fn handle_discard_or_suicidal(&self) -> Result<()>;
}

/// Handler for jobs that add segments: drops the job's segments that were
/// never committed.
#[derive(Debug)]
pub struct AddSegmentHandler {
    metadata: Arc<dyn MetadataStore>,
    project: String,
    model_id: String,
    segment_ids: BTreeSet<String>,
}

impl AddSegmentHandler {
    pub fn new(
        metadata: Arc<dyn MetadataStore>,
        project: impl Into<String>,
        model_id: impl Into<String>,
        segment_ids: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            metadata,
            project: project.into(),
            model_id: model_id.into(),
            segment_ids: segment_ids.into_iter().collect(),
        }
    }
}

impl ExecutableHandler for AddSegmentHandler {
    fn handle_discard_or_suicidal(&self) -> Result<()> {
        let mut removed = Vec::new();

        self.metadata.transaction(&self.project, &mut |meta| {
            removed.clear();
            let Some(dataflow) = meta.dataflow_mut(&self.model_id) else {
                return Ok(());
            };
            dataflow.segments.retain(|segment| {
                let drop = segment.status == SegmentStatus::New
                    && self.segment_ids.contains(&segment.id);
                if drop {
                    removed.push(segment.id.clone());
                }
                !drop
            });
            Ok(())
        })?;

        info!(
            project = %self.project,
            model = %self.model_id,
            removed = ?removed,
            "removed uncommitted segments of terminated job"
        );
        Ok(())
    }
}
