// src/dag/node.rs

//! The atomic unit of a job DAG.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::sync::Arc;

use crate::exec::ExecutableHandler;
use crate::types::JobType;

/// Canonical job / step identifier type.
pub type JobId = String;

/// Param holding the comma-delimited layout ids a job builds.
pub const P_LAYOUT_IDS: &str = "layout_ids";

/// What a child step of a job does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepKind {
    /// Optional diagnostic step estimating resources before the build.
    ResourceDetect,
    BuildLayouts,
    MergeSegments,
    SecondStorage,
    UpdateMetadata,
    TableSampling,
    BuildSnapshot,
}

impl fmt::Display for StepKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StepKind::ResourceDetect => "resource-detect",
            StepKind::BuildLayouts => "build-layouts",
            StepKind::MergeSegments => "merge-segments",
            StepKind::SecondStorage => "second-storage",
            StepKind::UpdateMetadata => "update-metadata",
            StepKind::TableSampling => "table-sampling",
            StepKind::BuildSnapshot => "build-snapshot",
        };
        f.write_str(s)
    }
}

/// A job root or one of its steps.
///
/// Identity, type and targets are fixed once the node is built. The DAG
/// edges (`previous_step` / `next_steps`) and the parent link are only
/// written by [`crate::dag::tree`] and [`crate::dag::rewire`], which keep
/// both sides of every edge consistent.
#[derive(Debug, Clone)]
pub struct ExecutableNode {
    id: JobId,
    job_type: JobType,
    project: String,
    step_kind: Option<StepKind>,
    target_subject: Option<String>,
    params: HashMap<String, String>,
    previous_step: Option<JobId>,
    next_steps: HashSet<JobId>,
    parent_id: Option<JobId>,
    target_segments: Vec<String>,
    partitions_by_segment: HashMap<String, BTreeSet<u64>>,
    create_time: u64,
    handler: Option<Arc<dyn ExecutableHandler>>,
}

impl ExecutableNode {
    pub fn new(id: impl Into<JobId>, job_type: JobType, project: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            job_type,
            project: project.into(),
            step_kind: None,
            target_subject: None,
            params: HashMap::new(),
            previous_step: None,
            next_steps: HashSet::new(),
            parent_id: None,
            target_segments: Vec::new(),
            partitions_by_segment: HashMap::new(),
            create_time: 0,
            handler: None,
        }
    }

    pub fn with_target_subject(mut self, model_id: impl Into<String>) -> Self {
        self.target_subject = Some(model_id.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    /// Set the `layout_ids` param from a list of layout ids.
    pub fn with_layouts(self, layout_ids: &[u64]) -> Self {
        let joined = layout_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(",");
        self.with_param(P_LAYOUT_IDS, joined)
    }

    pub fn with_target_segments<I, S>(mut self, segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.target_segments = segments.into_iter().map(Into::into).collect();
        self
    }

    /// Record the partitions this job targets inside `segment_id`.
    pub fn with_segment_partitions<I>(mut self, segment_id: impl Into<String>, partitions: I) -> Self
    where
        I: IntoIterator<Item = u64>,
    {
        self.partitions_by_segment
            .insert(segment_id.into(), partitions.into_iter().collect());
        self
    }

    pub fn with_create_time(mut self, create_time: u64) -> Self {
        self.create_time = create_time;
        self
    }

    pub fn with_handler(mut self, handler: Arc<dyn ExecutableHandler>) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn step_kind(&self) -> Option<StepKind> {
        self.step_kind
    }

    pub fn target_subject(&self) -> Option<&str> {
        self.target_subject.as_deref()
    }

    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    pub fn previous_step(&self) -> Option<&str> {
        self.previous_step.as_deref()
    }

    pub fn next_steps(&self) -> &HashSet<JobId> {
        &self.next_steps
    }

    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    /// The node's own target segments, without consulting its parent.
    pub fn target_segments(&self) -> &[String] {
        &self.target_segments
    }

    /// Partitions this job targets in `segment_id`, if they were recorded.
    pub fn partitions_of_segment(&self, segment_id: &str) -> Option<&BTreeSet<u64>> {
        self.partitions_by_segment.get(segment_id)
    }

    pub fn create_time(&self) -> u64 {
        self.create_time
    }

    pub fn handler(&self) -> Option<&Arc<dyn ExecutableHandler>> {
        self.handler.as_ref()
    }

    pub(crate) fn set_previous_step(&mut self, step: Option<JobId>) {
        self.previous_step = step;
    }

    pub(crate) fn set_next_steps(&mut self, steps: HashSet<JobId>) {
        self.next_steps = steps;
    }

    pub(crate) fn add_next_step(&mut self, step: JobId) {
        self.next_steps.insert(step);
    }

    pub(crate) fn set_parent_id(&mut self, parent: JobId) {
        self.parent_id = Some(parent);
    }

    /// Derive a child step that shares this node's job identity.
    pub(crate) fn derive_step(&self, id: JobId, kind: StepKind) -> Self {
        Self {
            id,
            job_type: self.job_type,
            project: self.project.clone(),
            step_kind: Some(kind),
            target_subject: self.target_subject.clone(),
            params: self.params.clone(),
            previous_step: None,
            next_steps: HashSet::new(),
            parent_id: Some(self.id.clone()),
            target_segments: Vec::new(),
            partitions_by_segment: HashMap::new(),
            create_time: self.create_time,
            handler: None,
        }
    }
}
