// src/metadata/model.rs

//! Read-only views of the model metadata consulted by job validity checks.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ManagementType, RealizationStatus, SegmentStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataModel {
    pub id: String,
    pub alias: String,
    pub management_type: ManagementType,
    pub multi_partition: bool,
    pub broken: bool,
}

impl DataModel {
    pub fn is_multi_partition_model(&self) -> bool {
        self.multi_partition
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentPartition {
    pub partition_id: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSegment {
    pub id: String,
    pub status: SegmentStatus,
    pub multi_partitions: Vec<SegmentPartition>,
    /// Layouts already built into this segment.
    pub layouts: BTreeSet<u64>,
}

impl DataSegment {
    pub fn partition_ids(&self) -> BTreeSet<u64> {
        self.multi_partitions.iter().map(|p| p.partition_id).collect()
    }
}

/// Materialized data of a model. The dataflow id equals the model id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dataflow {
    pub id: String,
    pub status: RealizationStatus,
    pub model: DataModel,
    pub segments: Vec<DataSegment>,
    pub broken: bool,
}

impl Dataflow {
    pub fn segment(&self, segment_id: &str) -> Option<&DataSegment> {
        self.segments.iter().find(|s| s.id == segment_id)
    }

    /// Broken either on its own, through its status, or through its model.
    pub fn check_broken_with_related_info(&self) -> bool {
        self.broken || self.status == RealizationStatus::Broken || self.model.broken
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutEntity {
    pub id: u64,
    /// Marked for removal by the next garbage-collection sweep.
    pub to_be_deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexPlan {
    pub id: String,
    pub layouts: Vec<LayoutEntity>,
}

impl IndexPlan {
    pub fn all_layout_ids(&self) -> BTreeSet<u64> {
        self.layouts.iter().map(|l| l.id).collect()
    }

    pub fn tombstoned_layout_ids(&self) -> BTreeSet<u64> {
        self.layouts
            .iter()
            .filter(|l| l.to_be_deleted)
            .map(|l| l.id)
            .collect()
    }
}

/// Everything the store holds for one project, keyed by model id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectMetadata {
    pub dataflows: BTreeMap<String, Dataflow>,
    pub index_plans: BTreeMap<String, IndexPlan>,
}

impl ProjectMetadata {
    pub fn dataflow_mut(&mut self, dataflow_id: &str) -> Option<&mut Dataflow> {
        self.dataflows.get_mut(dataflow_id)
    }

    pub fn index_plan_mut(&mut self, model_id: &str) -> Option<&mut IndexPlan> {
        self.index_plans.get_mut(model_id)
    }
}
