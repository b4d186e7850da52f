#![allow(dead_code)]

use std::collections::BTreeMap;

use modeljob::config::{
    ConfigFile, ConfigSection, EventConfig, EventKind, JobConfig, ModelConfig, RawConfigFile,
    SegmentConfig,
};
use modeljob::types::{
    JobStatus, JobType, ManagementType, RealizationStatus, SegmentStatus,
};

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                config: ConfigSection::default(),
                model: BTreeMap::new(),
                job: BTreeMap::new(),
                event: Vec::new(),
            },
        }
    }

    pub fn with_model(mut self, id: &str, model: ModelConfig) -> Self {
        self.config.model.insert(id.to_string(), model);
        self
    }

    pub fn with_job(mut self, id: &str, job: JobConfig) -> Self {
        self.config.job.insert(id.to_string(), job);
        self
    }

    pub fn with_event(mut self, kind: EventKind, job: &str) -> Self {
        self.config.event.push(EventConfig {
            kind,
            job: job.to_string(),
        });
        self
    }

    pub fn resource_detect(mut self, val: bool) -> Self {
        self.config.config.resource_detect = val;
        self
    }

    pub fn second_storage(mut self, val: bool) -> Self {
        self.config.config.second_storage = val;
        self
    }

    pub fn build_raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `ModelConfig`. Defaults to a model-based, online model with
/// an (empty) index plan.
pub struct ModelConfigBuilder {
    model: ModelConfig,
}

impl ModelConfigBuilder {
    pub fn new(project: &str) -> Self {
        Self {
            model: ModelConfig {
                project: project.to_string(),
                alias: None,
                management_type: ManagementType::ModelBased,
                multi_partition: false,
                status: RealizationStatus::Online,
                broken: false,
                model_broken: false,
                layouts: vec![],
                tombstoned_layouts: vec![],
                index_plan: true,
                segment: vec![],
            },
        }
    }

    pub fn management_type(mut self, val: ManagementType) -> Self {
        self.model.management_type = val;
        self
    }

    pub fn multi_partition(mut self, val: bool) -> Self {
        self.model.multi_partition = val;
        self
    }

    pub fn status(mut self, val: RealizationStatus) -> Self {
        self.model.status = val;
        self
    }

    pub fn broken(mut self, val: bool) -> Self {
        self.model.broken = val;
        self
    }

    pub fn model_broken(mut self, val: bool) -> Self {
        self.model.model_broken = val;
        self
    }

    pub fn layouts(mut self, ids: &[u64]) -> Self {
        self.model.layouts.extend_from_slice(ids);
        self
    }

    pub fn tombstoned_layouts(mut self, ids: &[u64]) -> Self {
        self.model.tombstoned_layouts.extend_from_slice(ids);
        self
    }

    pub fn without_index_plan(mut self) -> Self {
        self.model.index_plan = false;
        self
    }

    /// Add a ready segment with the given partitions.
    pub fn segment(self, id: &str, partitions: &[u64]) -> Self {
        self.segment_with_status(id, SegmentStatus::Ready, partitions)
    }

    pub fn segment_with_status(mut self, id: &str, status: SegmentStatus, partitions: &[u64]) -> Self {
        self.model.segment.push(SegmentConfig {
            id: id.to_string(),
            status,
            partitions: partitions.to_vec(),
            layouts: vec![],
        });
        self
    }

    pub fn build(self) -> ModelConfig {
        self.model
    }
}

/// Builder for `JobConfig`.
pub struct JobConfigBuilder {
    job: JobConfig,
}

impl JobConfigBuilder {
    pub fn new(job_type: JobType, project: &str, model: &str) -> Self {
        Self {
            job: JobConfig {
                job_type,
                project: project.to_string(),
                model: model.to_string(),
                segments: vec![],
                layouts: vec![],
                partitions: BTreeMap::new(),
                create_time: 0,
                status: JobStatus::Ready,
                resource_detect: None,
                second_storage: None,
            },
        }
    }

    pub fn segment(mut self, id: &str) -> Self {
        self.job.segments.push(id.to_string());
        self
    }

    pub fn layouts(mut self, ids: &[u64]) -> Self {
        self.job.layouts.extend_from_slice(ids);
        self
    }

    pub fn partitions(mut self, segment: &str, ids: &[u64]) -> Self {
        self.job
            .partitions
            .entry(segment.to_string())
            .or_default()
            .extend_from_slice(ids);
        self
    }

    pub fn create_time(mut self, val: u64) -> Self {
        self.job.create_time = val;
        self
    }

    pub fn status(mut self, val: JobStatus) -> Self {
        self.job.status = val;
        self
    }

    pub fn resource_detect(mut self, val: bool) -> Self {
        self.job.resource_detect = Some(val);
        self
    }

    pub fn second_storage(mut self, val: bool) -> Self {
        self.job.second_storage = Some(val);
        self
    }

    pub fn build(self) -> JobConfig {
        self.job
    }
}
