// src/gc/index_cleaner.rs

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::errors::Result;
use crate::gc::cleaner::MetadataCleaner;
use crate::metadata::ProjectMetadata;

/// Removes layouts tombstoned on index plans, together with the built copies
/// of those layouts in every segment of the model.
#[derive(Debug)]
pub struct IndexCleaner {
    project: String,
    pending: BTreeMap<String, BTreeSet<u64>>,
    removed: BTreeMap<String, BTreeSet<u64>>,
}

impl IndexCleaner {
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            pending: BTreeMap::new(),
            removed: BTreeMap::new(),
        }
    }

    /// Layouts removed per model by the last sweep.
    pub fn removed(&self) -> &BTreeMap<String, BTreeSet<u64>> {
        &self.removed
    }
}

impl MetadataCleaner for IndexCleaner {
    fn project(&self) -> &str {
        &self.project
    }

    fn name(&self) -> &'static str {
        "index"
    }

    fn before_cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()> {
        self.pending = meta
            .index_plans
            .iter()
            .map(|(model, plan)| (model.clone(), plan.tombstoned_layout_ids()))
            .filter(|(_, layouts)| !layouts.is_empty())
            .collect();
        self.removed.clear();

        debug!(project = %self.project, pending = ?self.pending, "collected tombstoned layouts");
        Ok(())
    }

    fn cleanup(&mut self, meta: &mut ProjectMetadata) -> Result<()> {
        for (model, layouts) in &self.pending {
            let Some(plan) = meta.index_plan_mut(model) else {
                continue;
            };
            plan.layouts.retain(|l| !layouts.contains(&l.id));

            if let Some(dataflow) = meta.dataflow_mut(model) {
                for segment in dataflow.segments.iter_mut() {
                    segment.layouts.retain(|id| !layouts.contains(id));
                }
            }

            self.removed.insert(model.clone(), layouts.clone());
        }
        Ok(())
    }

    fn after_cleanup(&mut self, _meta: &mut ProjectMetadata) -> Result<()> {
        let total: usize = self.removed.values().map(BTreeSet::len).sum();
        info!(
            project = %self.project,
            models = self.removed.len(),
            layouts = total,
            "removed tombstoned layouts"
        );
        self.pending.clear();
        Ok(())
    }
}
