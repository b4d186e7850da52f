#![allow(dead_code)]

use std::sync::Arc;

use modeljob::config::ConfigFile;
use modeljob::exec::{ExecutableOnModel, ExecutionManager, InMemoryExecutionManager};
use modeljob::metadata::{Dataflow, InMemoryMetadataStore, MetadataStore};
use modeljob::types::JobStatus;
use modeljob::{load_metadata, submit_jobs};

pub use modeljob_test_utils::builders::{ConfigFileBuilder, JobConfigBuilder, ModelConfigBuilder};
pub use modeljob_test_utils::init_tracing;

pub const PROJECT: &str = "default";

/// Metadata and submitted jobs built from one config.
pub struct Harness {
    pub metadata: Arc<InMemoryMetadataStore>,
    pub executions: Arc<InMemoryExecutionManager>,
}

impl Harness {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        init_tracing();
        let metadata = Arc::new(load_metadata(cfg));
        let executions =
            Arc::new(submit_jobs(cfg, metadata.clone()).expect("jobs should plan and submit"));
        Self {
            metadata,
            executions,
        }
    }

    /// Run `check_suicide` for a job or step of the default project.
    pub fn check_suicide(&self, job_id: &str) -> bool {
        let node = self
            .executions
            .job(PROJECT, job_id)
            .unwrap_or_else(|| panic!("job '{job_id}' should be submitted"));
        ExecutableOnModel::new(&node, self.executions.as_ref(), self.metadata.as_ref())
            .check_suicide()
    }

    pub fn cutting_in(&self, job_id: &str) -> bool {
        let node = self
            .executions
            .job(PROJECT, job_id)
            .unwrap_or_else(|| panic!("job '{job_id}' should be submitted"));
        ExecutableOnModel::new(&node, self.executions.as_ref(), self.metadata.as_ref())
            .check_cutting_in_job_by_model()
            .expect("cutting-in check should not fail")
    }

    pub fn dataflow(&self, model: &str) -> Dataflow {
        self.metadata
            .dataflow(PROJECT, model)
            .unwrap()
            .unwrap_or_else(|| panic!("dataflow '{model}' should exist"))
    }

    pub fn status(&self, job_id: &str) -> Option<JobStatus> {
        self.executions.status_of(PROJECT, job_id)
    }
}
