// src/dag/rewire.rs

//! Edge writers for job DAGs.
//!
//! Every function here writes *both* sides of the edges it creates: the
//! downstream node's `previous_step` and the upstream node's `next_steps`.
//! They do not look at edges the nodes already carry; the id-addressed
//! wrappers on [`crate::dag::ExecutableTree`] reject any call that would
//! strand an existing edge before delegating here.

use std::collections::HashSet;

use tracing::debug;

use crate::dag::node::ExecutableNode;

/// Insert the optional resource-detect step ahead of the index step and,
/// when present, the second-storage step.
///
/// With no resource-detect step this does nothing. Otherwise the index step
/// (and second-storage step) get `resource_detect` as their previous step,
/// and `resource_detect.next_steps` is replaced by exactly those ids.
pub fn init_resource_detect_dag_node(
    resource_detect: Option<&mut ExecutableNode>,
    index_step: &mut ExecutableNode,
    second_storage: Option<&mut ExecutableNode>,
) {
    let Some(resource_detect) = resource_detect else {
        return;
    };

    let detect_id = resource_detect.id().to_string();
    index_step.set_previous_step(Some(detect_id.clone()));

    let mut next_steps: HashSet<String> = HashSet::new();
    next_steps.insert(index_step.id().to_string());

    if let Some(second_storage) = second_storage {
        next_steps.insert(second_storage.id().to_string());
        second_storage.set_previous_step(Some(detect_id.clone()));
    }

    debug!(
        resource_detect = %detect_id,
        next_steps = ?next_steps,
        "inserted resource-detect step"
    );
    resource_detect.set_next_steps(next_steps);
}

/// Add a single `upstream -> downstream` edge.
///
/// If the downstream node already had a different previous step, that
/// upstream is not touched; callers wire each node once at plan time.
pub fn connect(upstream: &mut ExecutableNode, downstream: &mut ExecutableNode) {
    downstream.set_previous_step(Some(upstream.id().to_string()));
    upstream.add_next_step(downstream.id().to_string());
}
