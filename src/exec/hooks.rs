// src/exec/hooks.rs

//! Lifecycle hooks the scheduler invokes on error, discard and suicide.

use tracing::{debug, info};

use crate::errors::{ModeljobError, Result};
use crate::exec::on_model::ExecutableOnModel;
use crate::metadata::Dataflow;
use crate::types::{JobType, ManagementType, RealizationStatus};

impl ExecutableOnModel<'_> {
    /// Called when `job_id` failed. Failed incremental builds on a
    /// model-based model mark the dataflow lag-behind.
    pub fn on_execute_error_hook(&self, job_id: &str) -> Result<()> {
        self.mark_dataflow_lag_behind_if_necessary(job_id)
    }

    /// Called when `job_id` was discarded from outside.
    pub fn on_execute_discard_hook(&self, job_id: &str) -> Result<()> {
        self.forward_to_handler(job_id, "discard")
    }

    /// Called when `job_id` terminated itself after a failed validity check.
    pub fn on_execute_suicidal_hook(&self, job_id: &str) -> Result<()> {
        self.forward_to_handler(job_id, "suicide")
    }

    fn forward_to_handler(&self, job_id: &str, cause: &str) -> Result<()> {
        match self.node.handler() {
            Some(handler) => {
                debug!(job = %job_id, cause, "forwarding to job handler");
                handler.handle_discard_or_suicidal()
            }
            None => Ok(()),
        }
    }

    fn mark_dataflow_lag_behind_if_necessary(&self, job_id: &str) -> Result<()> {
        if self.node.job_type() != JobType::IncBuild {
            return Ok(());
        }

        let Some(dataflow) = self.dataflow_of_job(job_id)? else {
            return Ok(());
        };
        if dataflow.status == RealizationStatus::LagBehind {
            return Ok(());
        }
        if dataflow.model.management_type != ManagementType::ModelBased {
            return Ok(());
        }

        self.metadata.update_dataflow_status(
            self.project(),
            &dataflow.id,
            RealizationStatus::LagBehind,
        )?;
        info!(job = %job_id, dataflow = %dataflow.id, "dataflow marked lag-behind");
        Ok(())
    }

    /// Dataflow of the model targeted by `job_id`, which may be a job other
    /// than this node.
    fn dataflow_of_job(&self, job_id: &str) -> Result<Option<Dataflow>> {
        let job = self
            .executions
            .job(self.project(), job_id)
            .ok_or_else(|| ModeljobError::JobNotFound(job_id.to_string()))?;
        let model = job.target_subject().ok_or_else(|| {
            ModeljobError::InvariantViolation(format!("job '{job_id}' has no target model"))
        })?;
        self.metadata.dataflow(self.project(), model)
    }
}
