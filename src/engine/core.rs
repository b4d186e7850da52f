// src/engine/core.rs

//! Pure core of the lifecycle engine.
//!
//! The core consumes one [`LifecycleEvent`] at a time and produces the
//! commands for the scheduler. It has no channels and no Tokio types; all
//! IO goes through the execution manager and metadata store traits, so it
//! can be unit tested with the in-memory implementations.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::dag::ExecutableNode;
use crate::engine::{LifecycleCommand, LifecycleEvent, TerminationReason};
use crate::exec::{ExecutableOnModel, ExecutionManager};
use crate::metadata::MetadataStore;
use crate::types::JobStatus;

/// Decision returned by the core after handling a single event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoreStep {
    pub commands: Vec<LifecycleCommand>,
    /// Whether the outer runtime loop should keep running.
    pub keep_running: bool,
}

impl CoreStep {
    fn one(command: LifecycleCommand) -> Self {
        Self {
            commands: vec![command],
            keep_running: true,
        }
    }

    fn nothing() -> Self {
        Self {
            commands: Vec::new(),
            keep_running: true,
        }
    }
}

pub struct LifecycleCore {
    executions: Arc<dyn ExecutionManager>,
    metadata: Arc<dyn MetadataStore>,
}

impl fmt::Debug for LifecycleCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleCore").finish_non_exhaustive()
    }
}

impl LifecycleCore {
    pub fn new(executions: Arc<dyn ExecutionManager>, metadata: Arc<dyn MetadataStore>) -> Self {
        Self {
            executions,
            metadata,
        }
    }

    /// Handle a single event, returning the commands for the scheduler.
    pub fn step(&mut self, event: LifecycleEvent) -> CoreStep {
        match event {
            LifecycleEvent::ExecuteError { project, job_id } => {
                self.handle_execute_error(&project, job_id)
            }
            LifecycleEvent::Discarded { project, job_id } => {
                self.handle_discard(&project, job_id)
            }
            LifecycleEvent::ValidityCheck { project, job_id } => {
                self.handle_validity_check(&project, job_id)
            }
            LifecycleEvent::AdmissionCheck { project, job_id } => {
                self.handle_admission(&project, job_id)
            }
            LifecycleEvent::ShutdownRequested => CoreStep {
                commands: Vec::new(),
                keep_running: false,
            },
        }
    }

    fn handle_execute_error(&mut self, project: &str, job_id: String) -> CoreStep {
        let Some(node) = self.lookup(project, &job_id) else {
            return CoreStep::nothing();
        };
        if self.already_final(project, &job_id) {
            return CoreStep::nothing();
        }

        self.set_status(project, &job_id, JobStatus::Error);
        if let Err(e) = self.view(&node).on_execute_error_hook(&job_id) {
            error!(job = %job_id, error = %e, "execute-error hook failed");
        }
        CoreStep::one(LifecycleCommand::ErrorRecorded { job_id })
    }

    fn handle_discard(&mut self, project: &str, job_id: String) -> CoreStep {
        let Some(node) = self.lookup(project, &job_id) else {
            return CoreStep::nothing();
        };
        if self.already_final(project, &job_id) {
            return CoreStep::nothing();
        }

        self.set_status(project, &job_id, JobStatus::Discarded);
        if let Err(e) = self.view(&node).on_execute_discard_hook(&job_id) {
            error!(job = %job_id, error = %e, "discard hook failed");
        }
        info!(job = %job_id, "job discarded");
        CoreStep::one(LifecycleCommand::Terminate {
            job_id,
            reason: TerminationReason::Discarded,
        })
    }

    fn handle_validity_check(&mut self, project: &str, job_id: String) -> CoreStep {
        let Some(node) = self.lookup(project, &job_id) else {
            return CoreStep::nothing();
        };
        if self.already_final(project, &job_id) {
            return CoreStep::nothing();
        }

        let view = self.view(&node);
        if !view.check_suicide() {
            debug!(job = %job_id, "job targets still valid");
            return CoreStep::one(LifecycleCommand::Continue { job_id });
        }

        self.set_status(project, &job_id, JobStatus::Suicidal);
        if let Err(e) = view.on_execute_suicidal_hook(&job_id) {
            error!(job = %job_id, error = %e, "suicidal hook failed");
        }
        info!(job = %job_id, "job committed suicide");
        CoreStep::one(LifecycleCommand::Terminate {
            job_id,
            reason: TerminationReason::Suicide,
        })
    }

    fn handle_admission(&mut self, project: &str, job_id: String) -> CoreStep {
        let Some(node) = self.lookup(project, &job_id) else {
            return CoreStep::nothing();
        };

        match self.view(&node).check_cutting_in_job_by_model() {
            Ok(true) => {
                info!(job = %job_id, "job held back; another job is cutting in");
                CoreStep::one(LifecycleCommand::Hold { job_id })
            }
            Ok(false) => CoreStep::one(LifecycleCommand::Admit { job_id }),
            Err(e) => {
                warn!(job = %job_id, error = %e, "cutting-in check failed; holding job");
                CoreStep::one(LifecycleCommand::Hold { job_id })
            }
        }
    }

    fn lookup(&self, project: &str, job_id: &str) -> Option<Arc<ExecutableNode>> {
        let node = self.executions.job(project, job_id);
        if node.is_none() {
            warn!(project, job = %job_id, "event for unknown job; ignoring");
        }
        node
    }

    fn view<'a>(&'a self, node: &'a ExecutableNode) -> ExecutableOnModel<'a> {
        ExecutableOnModel::new(node, self.executions.as_ref(), self.metadata.as_ref())
    }

    fn already_final(&self, project: &str, job_id: &str) -> bool {
        let status = self.executions.status_of(project, job_id);
        let is_final = status.is_some_and(JobStatus::is_final);
        if is_final {
            debug!(job = %job_id, ?status, "job already terminal; ignoring event");
        }
        is_final
    }

    fn set_status(&self, project: &str, job_id: &str, status: JobStatus) {
        if let Err(e) = self.executions.update_status(project, job_id, status) {
            error!(job = %job_id, %status, error = %e, "failed to update job status");
        }
    }
}
