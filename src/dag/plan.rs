// src/dag/plan.rs

//! Job plan assembly.
//!
//! The planner turns a root node into an [`ExecutableTree`] with the steps
//! its job type needs, wires the edges, and attaches the discard/suicide
//! handler. Plans are built once, single-threaded, before any step runs.

use std::sync::Arc;

use tracing::{debug, info};

use crate::dag::graph::validate_tree;
use crate::dag::node::{ExecutableNode, StepKind};
use crate::dag::tree::ExecutableTree;
use crate::errors::Result;
use crate::exec::handler::AddSegmentHandler;
use crate::metadata::MetadataStore;
use crate::types::JobType;

/// Optional steps the planner may insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlanOptions {
    /// Insert a resource-detect step ahead of the build step.
    pub resource_detect: bool,
    /// Fan out to a second-storage step next to the build step.
    pub second_storage: bool,
}

impl Default for PlanOptions {
    fn default() -> Self {
        Self {
            resource_detect: true,
            second_storage: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct JobPlanner {
    options: PlanOptions,
    metadata: Arc<dyn MetadataStore>,
}

impl JobPlanner {
    pub fn new(options: PlanOptions, metadata: Arc<dyn MetadataStore>) -> Self {
        Self { options, metadata }
    }

    pub fn options(&self) -> PlanOptions {
        self.options
    }

    /// Plan a job with the planner's default options.
    pub fn plan(&self, root: ExecutableNode) -> Result<ExecutableTree> {
        self.plan_with(root, self.options)
    }

    pub fn plan_with(&self, root: ExecutableNode, options: PlanOptions) -> Result<ExecutableTree> {
        let root = self.attach_handler(root);
        let mut tree = ExecutableTree::new(root);

        match tree.root().job_type() {
            JobType::IncBuild
            | JobType::IndexBuild
            | JobType::IndexRefresh
            | JobType::SubPartitionBuild
            | JobType::SubPartitionRefresh => {
                add_build_steps(&mut tree, StepKind::BuildLayouts, options)?;
            }
            JobType::IndexMerge => {
                add_build_steps(&mut tree, StepKind::MergeSegments, options)?;
            }
            JobType::TableSampling => {
                tree.add_step(StepKind::TableSampling);
            }
            JobType::SnapshotBuild | JobType::SnapshotRefresh => {
                tree.add_step(StepKind::BuildSnapshot);
            }
        }

        validate_tree(&tree)?;

        info!(
            job = %tree.root().id(),
            job_type = %tree.root().job_type(),
            steps = tree.children().len(),
            "planned job"
        );
        Ok(tree)
    }

    fn attach_handler(&self, root: ExecutableNode) -> ExecutableNode {
        if root.handler().is_some() {
            return root;
        }

        match root.job_type() {
            JobType::IncBuild | JobType::SubPartitionBuild => {
                let Some(model) = root.target_subject() else {
                    return root;
                };
                let handler = AddSegmentHandler::new(
                    Arc::clone(&self.metadata),
                    root.project(),
                    model,
                    root.target_segments().to_vec(),
                );
                debug!(job = %root.id(), "attaching add-segment handler");
                root.with_handler(Arc::new(handler))
            }
            _ => root,
        }
    }
}

/// resource-detect? -> index step -> update-metadata, with second-storage
/// fanned out from resource-detect when enabled.
fn add_build_steps(
    tree: &mut ExecutableTree,
    index_kind: StepKind,
    options: PlanOptions,
) -> Result<()> {
    let detect = options
        .resource_detect
        .then(|| tree.add_step(StepKind::ResourceDetect));
    let index = tree.add_step(index_kind);
    let storage = options
        .second_storage
        .then(|| tree.add_step(StepKind::SecondStorage));
    let update = tree.add_step(StepKind::UpdateMetadata);

    tree.init_resource_detect_dag_node(detect.as_deref(), &index, storage.as_deref())?;
    tree.connect(&index, &update)?;
    Ok(())
}
