// src/metadata/memory.rs

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use tracing::{debug, warn};

use super::{Dataflow, IndexPlan, MetadataStore, ProjectMetadata};
use crate::errors::Result;

/// In-memory metadata store used by the CLI and tests.
///
/// Transactions work on a copy of the project's metadata under the write
/// lock and swap it in only when the unit of work succeeds.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    projects: RwLock<HashMap<String, ProjectMetadata>>,
}

impl InMemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_dataflow(&self, project: &str, dataflow: Dataflow) {
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        projects
            .entry(project.to_string())
            .or_default()
            .dataflows
            .insert(dataflow.id.clone(), dataflow);
    }

    pub fn put_index_plan(&self, project: &str, plan: IndexPlan) {
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        projects
            .entry(project.to_string())
            .or_default()
            .index_plans
            .insert(plan.id.clone(), plan);
    }

    pub fn remove_dataflow(&self, project: &str, dataflow_id: &str) -> Option<Dataflow> {
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        projects.get_mut(project)?.dataflows.remove(dataflow_id)
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn dataflow(&self, project: &str, model_id: &str) -> Result<Option<Dataflow>> {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(projects
            .get(project)
            .and_then(|p| p.dataflows.get(model_id))
            .cloned())
    }

    fn index_plan(&self, project: &str, model_id: &str) -> Result<Option<IndexPlan>> {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(projects
            .get(project)
            .and_then(|p| p.index_plans.get(model_id))
            .cloned())
    }

    fn snapshot(&self, project: &str) -> Result<ProjectMetadata> {
        let projects = self.projects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(projects.get(project).cloned().unwrap_or_default())
    }

    fn transaction(
        &self,
        project: &str,
        work: &mut dyn FnMut(&mut ProjectMetadata) -> Result<()>,
    ) -> Result<()> {
        let mut projects = self.projects.write().unwrap_or_else(PoisonError::into_inner);
        let mut working = projects.get(project).cloned().unwrap_or_default();

        match work(&mut working) {
            Ok(()) => {
                projects.insert(project.to_string(), working);
                debug!(project, "metadata transaction committed");
                Ok(())
            }
            Err(e) => {
                warn!(project, error = %e, "metadata transaction rolled back");
                Err(e)
            }
        }
    }
}
