// src/config/validate.rs

use std::collections::BTreeSet;

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{ModeljobError, Result};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::ModeljobError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(raw))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_models(cfg)?;
    validate_jobs(cfg)?;
    validate_events(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &RawConfigFile) -> Result<()> {
    if cfg.config.event_queue_length == 0 {
        return Err(ModeljobError::ConfigError(
            "[config].event_queue_length must be >= 1 (got 0)".to_string(),
        ));
    }
    Ok(())
}

fn validate_models(cfg: &RawConfigFile) -> Result<()> {
    for (id, model) in cfg.model.iter() {
        if model.project.trim().is_empty() {
            return Err(ModeljobError::ConfigError(format!(
                "model '{}' has an empty `project`",
                id
            )));
        }

        let mut seen = BTreeSet::new();
        for segment in model.segment.iter() {
            if !seen.insert(segment.id.as_str()) {
                return Err(ModeljobError::ConfigError(format!(
                    "model '{}' declares segment '{}' more than once",
                    id, segment.id
                )));
            }
        }
    }
    Ok(())
}

fn validate_jobs(cfg: &RawConfigFile) -> Result<()> {
    for (name, job) in cfg.job.iter() {
        let Some(model) = cfg.model.get(&job.model) else {
            return Err(ModeljobError::ConfigError(format!(
                "job '{}' targets unknown model '{}'",
                name, job.model
            )));
        };
        if model.project != job.project {
            return Err(ModeljobError::ConfigError(format!(
                "job '{}' is in project '{}' but model '{}' belongs to '{}'",
                name, job.project, job.model, model.project
            )));
        }

        if job.segments.is_empty() {
            return Err(ModeljobError::ConfigError(format!(
                "job '{}' must target at least one segment",
                name
            )));
        }

        for segment in job.partitions.keys() {
            if !job.segments.contains(segment) {
                return Err(ModeljobError::ConfigError(format!(
                    "job '{}' lists partitions for segment '{}' which it does not target",
                    name, segment
                )));
            }
        }
    }
    Ok(())
}

fn validate_events(cfg: &RawConfigFile) -> Result<()> {
    for (idx, event) in cfg.event.iter().enumerate() {
        if !cfg.job.contains_key(&event.job) {
            return Err(ModeljobError::ConfigError(format!(
                "event #{} references unknown job '{}'",
                idx, event.job
            )));
        }
    }
    Ok(())
}
