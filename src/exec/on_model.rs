// src/exec/on_model.rs

//! A job node bound to the stores it is checked against.

use std::sync::Arc;

use tracing::debug;

use crate::dag::ExecutableNode;
use crate::errors::{ModeljobError, Result};
use crate::exec::manager::ExecutionManager;
use crate::metadata::MetadataStore;

/// View of an executable node that targets a model.
///
/// Borrowing the node together with the execution manager and the metadata
/// store gives the validity checks (`validity.rs`), the lifecycle hooks
/// (`hooks.rs`) and the cutting-in check everything they look up, without
/// the node owning any of it.
#[derive(Debug, Clone, Copy)]
pub struct ExecutableOnModel<'a> {
    pub(crate) node: &'a ExecutableNode,
    pub(crate) executions: &'a dyn ExecutionManager,
    pub(crate) metadata: &'a dyn MetadataStore,
}

impl<'a> ExecutableOnModel<'a> {
    pub fn new(
        node: &'a ExecutableNode,
        executions: &'a dyn ExecutionManager,
        metadata: &'a dyn MetadataStore,
    ) -> Self {
        Self {
            node,
            executions,
            metadata,
        }
    }

    pub fn node(&self) -> &'a ExecutableNode {
        self.node
    }

    pub fn project(&self) -> &'a str {
        self.node.project()
    }

    /// The model this node's effects apply to.
    pub fn target_model(&self) -> Result<&'a str> {
        self.node.target_subject().ok_or_else(|| {
            ModeljobError::InvariantViolation(format!(
                "job '{}' has no target model",
                self.node.id()
            ))
        })
    }

    pub(crate) fn parent(&self) -> Option<Arc<ExecutableNode>> {
        self.executions.parent_of(self.node)
    }

    /// Whether a segment-changing job is cutting in ahead of this node's job.
    ///
    /// Only jobs adding layouts (index-build kinds) can be overtaken; for any
    /// other kind this is `false` without consulting the execution manager.
    pub fn check_cutting_in_job_by_model(&self) -> Result<bool> {
        let parent = self.parent();
        let job: &ExecutableNode = parent.as_deref().unwrap_or(self.node);

        if !job.job_type().is_build_index_job() {
            return Ok(false);
        }

        let model = job.target_subject().ok_or_else(|| {
            ModeljobError::InvariantViolation(format!("job '{}' has no target model", job.id()))
        })?;
        let count = self
            .executions
            .count_cutting_in_jobs_by_model(job.project(), model, job)?;

        debug!(job = %job.id(), model, count, "cutting-in jobs on model");
        Ok(count > 0)
    }
}
