// src/dag/graph.rs

//! Structural checks over a planned job tree.

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::dag::tree::ExecutableTree;
use crate::errors::{ModeljobError, Result};

/// Check that every step edge is written on both sides and that the steps
/// form a DAG.
///
/// Edge direction: `upstream -> downstream`, i.e. from a node to each id in
/// its `next_steps`.
pub fn validate_tree(tree: &ExecutableTree) -> Result<()> {
    validate_edges(tree)?;
    execution_order(tree).map(|_| ())
}

/// Step ids in an order that respects every `previous_step` edge.
pub fn execution_order(tree: &ExecutableTree) -> Result<Vec<String>> {
    let mut graph: DiGraphMap<&str, ()> = DiGraphMap::new();

    for step in tree.children() {
        graph.add_node(step.id());
    }
    for step in tree.children() {
        for next in step.next_steps() {
            graph.add_edge(step.id(), next.as_str(), ());
        }
    }

    match toposort(&graph, None) {
        Ok(order) => Ok(order.into_iter().map(str::to_string).collect()),
        Err(cycle) => Err(ModeljobError::DagCycle(format!(
            "cycle detected in job '{}' involving step '{}'",
            tree.root().id(),
            cycle.node_id()
        ))),
    }
}

fn validate_edges(tree: &ExecutableTree) -> Result<()> {
    let job = tree.root().id();

    for step in tree.children() {
        if let Some(prev) = step.previous_step() {
            let upstream = tree.step(prev).ok_or_else(|| {
                ModeljobError::DagEdge(format!(
                    "step '{}' of job '{}' follows unknown step '{}'",
                    step.id(),
                    job,
                    prev
                ))
            })?;
            if !upstream.next_steps().contains(step.id()) {
                return Err(ModeljobError::DagEdge(format!(
                    "step '{}' follows '{}' but is missing from its next steps",
                    step.id(),
                    prev
                )));
            }
        }

        for next in step.next_steps() {
            let downstream = tree.step(next).ok_or_else(|| {
                ModeljobError::DagEdge(format!(
                    "step '{}' of job '{}' leads to unknown step '{}'",
                    step.id(),
                    job,
                    next
                ))
            })?;
            if downstream.previous_step() != Some(step.id()) {
                return Err(ModeljobError::DagEdge(format!(
                    "step '{}' lists '{}' as next, but '{}' does not follow it",
                    step.id(),
                    next,
                    next
                )));
            }
        }
    }

    Ok(())
}
