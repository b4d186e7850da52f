// src/exec/manager.rs

//! Project-scoped table of submitted jobs.
//!
//! Nodes are stored by id and shared as `Arc<ExecutableNode>`; a node's
//! parent and any sibling job are reached through lookups here rather than
//! through owning pointers.

use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::{debug, info};

use crate::dag::{ExecutableNode, ExecutableTree, JobId};
use crate::errors::{ModeljobError, Result};
use crate::types::{JobStatus, JobType};

/// Read/write access to the execution state the validity layer needs.
pub trait ExecutionManager: Send + Sync + Debug {
    fn job(&self, project: &str, job_id: &str) -> Option<Arc<ExecutableNode>>;

    fn status_of(&self, project: &str, job_id: &str) -> Option<JobStatus>;

    fn update_status(&self, project: &str, job_id: &str, status: JobStatus) -> Result<()>;

    /// Number of jobs cutting in ahead of `reference` on `model_id`.
    fn count_cutting_in_jobs_by_model(
        &self,
        project: &str,
        model_id: &str,
        reference: &ExecutableNode,
    ) -> Result<usize>;

    /// The owning job of a step, if the node has one and it is known.
    fn parent_of(&self, node: &ExecutableNode) -> Option<Arc<ExecutableNode>> {
        let parent_id = node.parent_id()?;
        self.job(node.project(), parent_id)
    }

    /// Target segments a node is accountable for: the parent's list when
    /// the node has a parent, otherwise its own.
    fn effective_target_segments(&self, node: &ExecutableNode) -> Vec<String> {
        match self.parent_of(node) {
            Some(parent) => parent.target_segments().to_vec(),
            None => node.target_segments().to_vec(),
        }
    }
}

#[derive(Debug, Default)]
struct ProjectJobs {
    nodes: HashMap<JobId, Arc<ExecutableNode>>,
    statuses: HashMap<JobId, JobStatus>,
}

/// In-memory execution manager used by the CLI and tests.
#[derive(Debug, Default)]
pub struct InMemoryExecutionManager {
    projects: RwLock<HashMap<String, ProjectJobs>>,
}

impl InMemoryExecutionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a planned job: the root gets `status`, every step starts `Ready`.
    pub fn submit(&self, tree: ExecutableTree, status: JobStatus) -> Result<()> {
        let (root, children) = tree.into_parts();
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        let jobs = projects.entry(root.project().to_string()).or_default();

        if jobs.nodes.contains_key(root.id()) {
            return Err(ModeljobError::ConfigError(format!(
                "job '{}' already submitted to project '{}'",
                root.id(),
                root.project()
            )));
        }

        info!(
            job = %root.id(),
            project = %root.project(),
            steps = children.len(),
            %status,
            "job submitted"
        );

        jobs.statuses.insert(root.id().to_string(), status);
        jobs.nodes.insert(root.id().to_string(), Arc::new(root));
        for child in children {
            jobs.statuses.insert(child.id().to_string(), JobStatus::Ready);
            jobs.nodes.insert(child.id().to_string(), Arc::new(child));
        }
        Ok(())
    }
}

impl ExecutionManager for InMemoryExecutionManager {
    fn job(&self, project: &str, job_id: &str) -> Option<Arc<ExecutableNode>> {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        projects.get(project)?.nodes.get(job_id).cloned()
    }

    fn status_of(&self, project: &str, job_id: &str) -> Option<JobStatus> {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        projects.get(project)?.statuses.get(job_id).copied()
    }

    fn update_status(&self, project: &str, job_id: &str, status: JobStatus) -> Result<()> {
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        let slot = projects
            .get_mut(project)
            .and_then(|jobs| jobs.statuses.get_mut(job_id))
            .ok_or_else(|| ModeljobError::JobNotFound(job_id.to_string()))?;

        debug!(job = %job_id, from = %slot, to = %status, "job status changed");
        *slot = status;
        Ok(())
    }

    /// Counts root jobs on the same model, created after `reference`, still
    /// in a non-final status, whose job type changes segments.
    fn count_cutting_in_jobs_by_model(
        &self,
        project: &str,
        model_id: &str,
        reference: &ExecutableNode,
    ) -> Result<usize> {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        let Some(jobs) = projects.get(project) else {
            return Ok(0);
        };

        let count = jobs
            .nodes
            .values()
            .filter(|n| n.parent_id().is_none())
            .filter(|n| n.id() != reference.id())
            .filter(|n| n.target_subject() == Some(model_id))
            .filter(|n| n.create_time() > reference.create_time())
            .filter(|n| JobType::changes_segments(n.job_type()))
            .filter(|n| {
                jobs.statuses
                    .get(n.id())
                    .is_some_and(|status| !status.is_final())
            })
            .count();

        Ok(count)
    }
}
