// src/dag/mod.rs

//! Job DAG representation and assembly.
//!
//! - [`node`] holds the executable node (a job root or one of its steps).
//! - [`tree`] groups a root with its ordered child steps.
//! - [`rewire`] is the only writer of `previous_step` / `next_steps` edges.
//! - [`graph`] validates edge consistency and acyclicity.
//! - [`plan`] lays out the steps each job type needs.

pub mod graph;
pub mod node;
pub mod plan;
pub mod rewire;
pub mod tree;

pub use graph::{execution_order, validate_tree};
pub use node::{ExecutableNode, JobId, P_LAYOUT_IDS, StepKind};
pub use plan::{JobPlanner, PlanOptions};
pub use rewire::{connect, init_resource_detect_dag_node};
pub use tree::ExecutableTree;
