// src/config/model.rs

use std::collections::{BTreeMap, BTreeSet};

use serde::Deserialize;

use crate::dag::{ExecutableNode, PlanOptions};
use crate::engine::LifecycleEvent;
use crate::metadata::{
    DataModel, DataSegment, Dataflow, IndexPlan, LayoutEntity, SegmentPartition,
};
use crate::types::{JobStatus, JobType, ManagementType, RealizationStatus, SegmentStatus};

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [config]
/// resource_detect = true
///
/// [model.m1]
/// project = "default"
/// management_type = "model_based"
/// layouts = [1, 10001]
/// [[model.m1.segment]]
/// id = "s1"
///
/// [job.j1]
/// job_type = "inc_build"
/// project = "default"
/// model = "m1"
/// segments = ["s1"]
///
/// [[event]]
/// kind = "validity_check"
/// job = "j1"
/// ```
///
/// All sections are optional and have reasonable defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    #[serde(default)]
    pub config: ConfigSection,

    /// Models from `[model.<id>]`, keyed by model id.
    #[serde(default)]
    pub model: BTreeMap<String, ModelConfig>,

    /// Jobs from `[job.<id>]`, keyed by job id.
    #[serde(default)]
    pub job: BTreeMap<String, JobConfig>,

    /// Lifecycle events from `[[event]]`, replayed in order.
    #[serde(default)]
    pub event: Vec<EventConfig>,
}

/// Validated configuration.
///
/// Only constructed through `TryFrom<RawConfigFile>` (see `validate.rs`).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub config: ConfigSection,
    pub model: BTreeMap<String, ModelConfig>,
    pub job: BTreeMap<String, JobConfig>,
    pub event: Vec<EventConfig>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            config: raw.config,
            model: raw.model,
            job: raw.job,
            event: raw.event,
        }
    }

    /// Projects mentioned by any model, sorted.
    pub fn projects(&self) -> Vec<String> {
        let projects: BTreeSet<String> = self.model.values().map(|m| m.project.clone()).collect();
        projects.into_iter().collect()
    }

    /// Lifecycle events, resolved against the project of the job they name.
    pub fn lifecycle_events(&self) -> Vec<LifecycleEvent> {
        self.event
            .iter()
            .filter_map(|e| {
                let job = self.job.get(&e.job)?;
                Some(e.to_event(&job.project))
            })
            .collect()
    }
}

/// `[config]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigSection {
    /// Insert a resource-detect step ahead of build steps.
    #[serde(default = "default_true")]
    pub resource_detect: bool,

    /// Fan out to a second-storage step next to the build step.
    #[serde(default)]
    pub second_storage: bool,

    /// Capacity of the lifecycle event channel.
    #[serde(default = "default_event_queue_length")]
    pub event_queue_length: usize,
}

fn default_true() -> bool {
    true
}

fn default_event_queue_length() -> usize {
    64
}

impl Default for ConfigSection {
    fn default() -> Self {
        Self {
            resource_detect: true,
            second_storage: false,
            event_queue_length: default_event_queue_length(),
        }
    }
}

impl ConfigSection {
    pub fn plan_options(&self) -> PlanOptions {
        PlanOptions {
            resource_detect: self.resource_detect,
            second_storage: self.second_storage,
        }
    }
}

/// `[model.<id>]` section: a model together with its dataflow and index plan.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    pub project: String,

    #[serde(default)]
    pub alias: Option<String>,

    #[serde(default)]
    pub management_type: ManagementType,

    #[serde(default)]
    pub multi_partition: bool,

    /// Dataflow status.
    #[serde(default)]
    pub status: RealizationStatus,

    /// The dataflow itself is broken.
    #[serde(default)]
    pub broken: bool,

    /// The model definition behind the dataflow is broken.
    #[serde(default)]
    pub model_broken: bool,

    /// Layout ids on the index plan.
    #[serde(default)]
    pub layouts: Vec<u64>,

    /// Layout ids on the index plan marked for removal.
    #[serde(default)]
    pub tombstoned_layouts: Vec<u64>,

    /// Set to false to model a dataflow whose index plan is gone.
    #[serde(default = "default_true")]
    pub index_plan: bool,

    #[serde(default)]
    pub segment: Vec<SegmentConfig>,
}

impl ModelConfig {
    pub fn to_dataflow(&self, model_id: &str) -> Dataflow {
        Dataflow {
            id: model_id.to_string(),
            status: self.status,
            model: DataModel {
                id: model_id.to_string(),
                alias: self.alias.clone().unwrap_or_else(|| model_id.to_string()),
                management_type: self.management_type,
                multi_partition: self.multi_partition,
                broken: self.model_broken,
            },
            segments: self.segment.iter().map(SegmentConfig::to_segment).collect(),
            broken: self.broken,
        }
    }

    pub fn to_index_plan(&self, model_id: &str) -> Option<IndexPlan> {
        if !self.index_plan {
            return None;
        }

        let tombstoned: BTreeSet<u64> = self.tombstoned_layouts.iter().copied().collect();
        let mut ids: BTreeSet<u64> = self.layouts.iter().copied().collect();
        ids.extend(tombstoned.iter().copied());

        Some(IndexPlan {
            id: model_id.to_string(),
            layouts: ids
                .into_iter()
                .map(|id| LayoutEntity {
                    id,
                    to_be_deleted: tombstoned.contains(&id),
                })
                .collect(),
        })
    }
}

/// `[[model.<id>.segment]]` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct SegmentConfig {
    pub id: String,

    #[serde(default)]
    pub status: SegmentStatus,

    #[serde(default)]
    pub partitions: Vec<u64>,

    /// Layouts already built into the segment.
    #[serde(default)]
    pub layouts: Vec<u64>,
}

impl SegmentConfig {
    pub fn to_segment(&self) -> DataSegment {
        DataSegment {
            id: self.id.clone(),
            status: self.status,
            multi_partitions: self
                .partitions
                .iter()
                .map(|&partition_id| SegmentPartition { partition_id })
                .collect(),
            layouts: self.layouts.iter().copied().collect(),
        }
    }
}

/// `[job.<id>]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub job_type: JobType,

    pub project: String,

    /// Target model id.
    pub model: String,

    /// Target segment ids; at least one.
    pub segments: Vec<String>,

    /// Layouts the job builds; empty places no layout constraint.
    #[serde(default)]
    pub layouts: Vec<u64>,

    /// Targeted partitions per segment, for multi-partition models.
    #[serde(default)]
    pub partitions: BTreeMap<String, Vec<u64>>,

    #[serde(default)]
    pub create_time: u64,

    #[serde(default)]
    pub status: JobStatus,

    /// Overrides `[config].resource_detect` for this job.
    #[serde(default)]
    pub resource_detect: Option<bool>,

    /// Overrides `[config].second_storage` for this job.
    #[serde(default)]
    pub second_storage: Option<bool>,
}

impl JobConfig {
    /// Root node of the job, before planning.
    pub fn to_root_node(&self, job_id: &str) -> ExecutableNode {
        let mut node = ExecutableNode::new(job_id, self.job_type, self.project.clone())
            .with_target_subject(self.model.clone())
            .with_target_segments(self.segments.iter().cloned())
            .with_create_time(self.create_time);

        if !self.layouts.is_empty() {
            node = node.with_layouts(&self.layouts);
        }
        for (segment, partitions) in &self.partitions {
            node = node.with_segment_partitions(segment.clone(), partitions.iter().copied());
        }
        node
    }

    pub fn plan_options(&self, defaults: PlanOptions) -> PlanOptions {
        PlanOptions {
            resource_detect: self.resource_detect.unwrap_or(defaults.resource_detect),
            second_storage: self.second_storage.unwrap_or(defaults.second_storage),
        }
    }
}

/// Kind of a replayed lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ExecuteError,
    Discard,
    ValidityCheck,
    AdmissionCheck,
}

/// `[[event]]` entries.
#[derive(Debug, Clone, Deserialize)]
pub struct EventConfig {
    pub kind: EventKind,
    /// Id of the job the event is about.
    pub job: String,
}

impl EventConfig {
    pub fn to_event(&self, project: &str) -> LifecycleEvent {
        let project = project.to_string();
        let job_id = self.job.clone();
        match self.kind {
            EventKind::ExecuteError => LifecycleEvent::ExecuteError { project, job_id },
            EventKind::Discard => LifecycleEvent::Discarded { project, job_id },
            EventKind::ValidityCheck => LifecycleEvent::ValidityCheck { project, job_id },
            EventKind::AdmissionCheck => LifecycleEvent::AdmissionCheck { project, job_id },
        }
    }
}
