// src/metadata/mod.rs

//! Narrow interface to the model metadata store.
//!
//! Validity checks read fresh snapshots through [`MetadataStore`] on every
//! call; nothing here caches across calls because other actors may change
//! segments and layouts at any time. Writes go through
//! [`MetadataStore::transaction`].

use std::fmt::Debug;

use crate::errors::{ModeljobError, Result};
use crate::types::RealizationStatus;

pub mod memory;
pub mod model;

pub use memory::InMemoryMetadataStore;
pub use model::{
    DataModel, DataSegment, Dataflow, IndexPlan, LayoutEntity, ProjectMetadata,
    SegmentPartition,
};

/// Abstract metadata store, scoped per project.
pub trait MetadataStore: Send + Sync + Debug {
    /// Current dataflow of a model, or `None` if it no longer exists.
    fn dataflow(&self, project: &str, model_id: &str) -> Result<Option<Dataflow>>;

    /// Current index plan of a model, or `None` if it no longer exists.
    fn index_plan(&self, project: &str, model_id: &str) -> Result<Option<IndexPlan>>;

    /// Copy of everything the store holds for `project`.
    fn snapshot(&self, project: &str) -> Result<ProjectMetadata>;

    /// Run `work` inside one metadata transaction for `project`.
    ///
    /// Either every mutation made by `work` becomes visible, or (when `work`
    /// returns an error) none does. `work` must not call back into the store.
    fn transaction(
        &self,
        project: &str,
        work: &mut dyn FnMut(&mut ProjectMetadata) -> Result<()>,
    ) -> Result<()>;

    fn update_dataflow_status(
        &self,
        project: &str,
        dataflow_id: &str,
        status: RealizationStatus,
    ) -> Result<()> {
        self.transaction(project, &mut |meta| {
            let dataflow = meta
                .dataflow_mut(dataflow_id)
                .ok_or_else(|| ModeljobError::DataflowNotFound(dataflow_id.to_string()))?;
            dataflow.status = status;
            Ok(())
        })
    }
}
