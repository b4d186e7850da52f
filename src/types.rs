use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

/// Kind of job a node belongs to.
///
/// The job type decides which validity rules and lifecycle hooks apply, and
/// which steps the planner lays out for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    /// Build new segments for a model.
    IncBuild,
    /// Build additional layouts on existing segments.
    IndexBuild,
    /// Rebuild existing segments.
    IndexRefresh,
    /// Merge several segments into one.
    IndexMerge,
    /// Build new sub-partitions of a multi-partition model.
    SubPartitionBuild,
    /// Rebuild existing sub-partitions.
    SubPartitionRefresh,
    TableSampling,
    SnapshotBuild,
    SnapshotRefresh,
}

impl JobType {
    /// Jobs that add layouts to already existing data, and can therefore be
    /// overtaken by jobs that change the segments underneath them.
    pub fn is_build_index_job(self) -> bool {
        matches!(self, JobType::IndexBuild | JobType::SubPartitionBuild)
    }

    /// Jobs whose commit changes the segment list of a dataflow.
    pub fn changes_segments(self) -> bool {
        matches!(
            self,
            JobType::IncBuild
                | JobType::IndexRefresh
                | JobType::IndexMerge
                | JobType::SubPartitionRefresh
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            JobType::IncBuild => "inc_build",
            JobType::IndexBuild => "index_build",
            JobType::IndexRefresh => "index_refresh",
            JobType::IndexMerge => "index_merge",
            JobType::SubPartitionBuild => "sub_partition_build",
            JobType::SubPartitionRefresh => "sub_partition_refresh",
            JobType::TableSampling => "table_sampling",
            JobType::SnapshotBuild => "snapshot_build",
            JobType::SnapshotRefresh => "snapshot_refresh",
        }
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JobType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inc_build" => Ok(JobType::IncBuild),
            "index_build" => Ok(JobType::IndexBuild),
            "index_refresh" => Ok(JobType::IndexRefresh),
            "index_merge" => Ok(JobType::IndexMerge),
            "sub_partition_build" => Ok(JobType::SubPartitionBuild),
            "sub_partition_refresh" => Ok(JobType::SubPartitionRefresh),
            "table_sampling" => Ok(JobType::TableSampling),
            "snapshot_build" => Ok(JobType::SnapshotBuild),
            "snapshot_refresh" => Ok(JobType::SnapshotRefresh),
            other => Err(format!("invalid job_type: {other}")),
        }
    }
}

/// Execution status of a job or step, as tracked by the execution manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Ready,
    Running,
    Paused,
    Error,
    Succeed,
    Discarded,
    Suicidal,
}

impl JobStatus {
    /// Terminal statuses never transition again.
    pub fn is_final(self) -> bool {
        matches!(
            self,
            JobStatus::Succeed | JobStatus::Discarded | JobStatus::Suicidal
        )
    }
}

impl Default for JobStatus {
    fn default() -> Self {
        JobStatus::Ready
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Ready => "ready",
            JobStatus::Running => "running",
            JobStatus::Paused => "paused",
            JobStatus::Error => "error",
            JobStatus::Succeed => "succeed",
            JobStatus::Discarded => "discarded",
            JobStatus::Suicidal => "suicidal",
        };
        f.write_str(s)
    }
}

/// Serving status of a dataflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RealizationStatus {
    Online,
    Offline,
    /// Materialized data has fallen behind the model definition.
    LagBehind,
    Broken,
}

impl Default for RealizationStatus {
    fn default() -> Self {
        RealizationStatus::Online
    }
}

impl FromStr for RealizationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "online" => Ok(RealizationStatus::Online),
            "offline" => Ok(RealizationStatus::Offline),
            "lag_behind" => Ok(RealizationStatus::LagBehind),
            "broken" => Ok(RealizationStatus::Broken),
            other => Err(format!(
                "invalid status: {other} (expected online, offline, lag_behind or broken)"
            )),
        }
    }
}

/// Who owns the segment lifecycle of a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManagementType {
    /// Segments are managed through the model itself; failed incremental
    /// builds flip the dataflow to lag-behind automatically.
    ModelBased,
    /// Segments follow the loading of the fact table.
    TableOriented,
}

impl Default for ManagementType {
    fn default() -> Self {
        ManagementType::TableOriented
    }
}

/// Build status of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SegmentStatus {
    /// Created by a running job and not yet committed.
    New,
    Ready,
}

impl Default for SegmentStatus {
    fn default() -> Self {
        SegmentStatus::Ready
    }
}
