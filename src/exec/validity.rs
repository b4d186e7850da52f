// src/exec/validity.rs

//! Target validity: does the job still correspond to data that exists?
//!
//! Both the segment and the layout checks are existential. A job stays
//! alive as long as *some* of its targets are still meaningful, even when
//! other targets were deleted concurrently.

use std::collections::BTreeSet;

use tracing::{debug, info, warn};

use crate::dag::P_LAYOUT_IDS;
use crate::errors::{ModeljobError, Result};
use crate::exec::on_model::ExecutableOnModel;

impl ExecutableOnModel<'_> {
    /// `true` when the job no longer has a valid target and must terminate
    /// itself.
    ///
    /// Any error raised while evaluating counts as "must suicide".
    pub fn check_suicide(&self) -> bool {
        let verdict = self.check_any_target_segment_and_partition_exists().and_then(
            |segments_exist| {
                if !segments_exist {
                    return Ok(false);
                }
                self.check_any_layout_exists()
            },
        );

        match verdict {
            Ok(true) => false,
            Ok(false) => {
                info!(job = %self.node.id(), "job targets no longer exist; job must suicide");
                true
            }
            Err(e) => {
                warn!(
                    job = %self.node.id(),
                    error = %e,
                    "validity check failed; treating job as suicidal"
                );
                true
            }
        }
    }

    /// Whether any requested layout is still on the model's index plan.
    ///
    /// An empty or missing `layout_ids` param places no layout constraint on
    /// the job.
    pub fn check_any_layout_exists(&self) -> Result<bool> {
        let requested = split_and_trim(self.node.param(P_LAYOUT_IDS).unwrap_or_default(), ',');
        if requested.is_empty() {
            return Ok(true);
        }

        let model = self.target_model()?;
        let plan = self
            .metadata
            .index_plan(self.project(), model)?
            .ok_or_else(|| ModeljobError::IndexPlanNotFound(model.to_string()))?;

        let all_layout_ids: BTreeSet<String> = plan
            .all_layout_ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect();

        let exists = requested.iter().any(|id| all_layout_ids.contains(id));
        if !exists {
            info!(
                job = %self.node.id(),
                model,
                requested = ?requested,
                "none of the requested layouts remain on the index plan"
            );
        }
        Ok(exists)
    }

    /// Whether any effective target segment (and its targeted partitions)
    /// still exists.
    pub fn check_any_target_segment_and_partition_exists(&self) -> Result<bool> {
        let target_segments = self.executions.effective_target_segments(self.node);
        if target_segments.is_empty() {
            return Err(ModeljobError::InvariantViolation(format!(
                "job '{}' declares no target segments",
                self.node.id()
            )));
        }

        for segment_id in &target_segments {
            if self.check_target_segment_and_partition_exists(segment_id)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn check_target_segment_and_partition_exists(&self, segment_id: &str) -> Result<bool> {
        let model = self.target_model()?;
        let Some(dataflow) = self.metadata.dataflow(self.project(), model)? else {
            info!(job = %self.node.id(), model, "dataflow no longer exists");
            return Ok(false);
        };
        if dataflow.check_broken_with_related_info() {
            info!(job = %self.node.id(), model, "dataflow is broken");
            return Ok(false);
        }

        // Deleted segments, and segments gone after a multi-partition change.
        let Some(segment) = dataflow.segment(segment_id) else {
            info!(job = %self.node.id(), segment = %segment_id, "target segment no longer exists");
            return Ok(false);
        };

        if !dataflow.model.is_multi_partition_model() {
            return Ok(true);
        }

        let current = segment.partition_ids();
        let Some(targeted) = self.partitions_by_segment(segment_id) else {
            warn!(
                job = %self.node.id(),
                segment = %segment_id,
                "segment doesn't contain any partition in this job"
            );
            return Ok(true);
        };

        if let Some(missing) = targeted.iter().find(|p| !current.contains(*p)) {
            info!(
                job = %self.node.id(),
                segment = %segment_id,
                partition = missing,
                "targeted partition no longer exists"
            );
            return Ok(false);
        }

        debug!(job = %self.node.id(), segment = %segment_id, "target segment still valid");
        Ok(true)
    }

    /// Partitions the job targets in `segment_id`. Recorded on the job root,
    /// so steps defer to their parent like they do for target segments.
    fn partitions_by_segment(&self, segment_id: &str) -> Option<BTreeSet<u64>> {
        match self.parent() {
            Some(parent) => parent.partitions_of_segment(segment_id).cloned(),
            None => self.node.partitions_of_segment(segment_id).cloned(),
        }
    }
}

/// Split on `sep`, trim every token and drop the empty ones.
pub fn split_and_trim(input: &str, sep: char) -> Vec<String> {
    input
        .split(sep)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
