// src/dag/tree.rs

use crate::dag::node::{ExecutableNode, JobId, StepKind};
use crate::dag::rewire;
use crate::errors::{ModeljobError, Result};

/// A job instance: the root node plus its ordered child steps.
///
/// Trees only exist while a job plan is being assembled. Once submitted to
/// an execution manager the nodes are stored by id, and parent/child
/// relations become lookups.
#[derive(Debug, Clone)]
pub struct ExecutableTree {
    root: ExecutableNode,
    children: Vec<ExecutableNode>,
}

impl ExecutableTree {
    pub fn new(root: ExecutableNode) -> Self {
        Self {
            root,
            children: Vec::new(),
        }
    }

    /// Append a step derived from the root and return its id.
    ///
    /// Step ids are `<root id>_<index>` with a two-digit, zero-based index.
    pub fn add_step(&mut self, kind: StepKind) -> JobId {
        let id = format!("{}_{:02}", self.root.id(), self.children.len());
        let step = self.root.derive_step(id.clone(), kind);
        self.children.push(step);
        id
    }

    /// Append an externally built step, re-parenting it under the root.
    pub fn push_step(&mut self, mut step: ExecutableNode) -> Result<()> {
        if self.contains(step.id()) {
            return Err(ModeljobError::DagEdge(format!(
                "duplicate step id '{}' in job '{}'",
                step.id(),
                self.root.id()
            )));
        }
        step.set_parent_id(self.root.id().to_string());
        self.children.push(step);
        Ok(())
    }

    pub fn root(&self) -> &ExecutableNode {
        &self.root
    }

    pub fn children(&self) -> &[ExecutableNode] {
        &self.children
    }

    pub fn step(&self, id: &str) -> Option<&ExecutableNode> {
        self.children.iter().find(|c| c.id() == id)
    }

    pub fn step_of_kind(&self, kind: StepKind) -> Option<&ExecutableNode> {
        self.children.iter().find(|c| c.step_kind() == Some(kind))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.root.id() == id || self.step(id).is_some()
    }

    /// Target segments are declared on the root and shared by every step.
    pub fn target_segments(&self) -> &[String] {
        self.root.target_segments()
    }

    /// Tree-level wrapper around [`rewire::init_resource_detect_dag_node`]
    /// addressing steps by id.
    pub fn init_resource_detect_dag_node(
        &mut self,
        resource_detect: Option<&str>,
        index_step: &str,
        second_storage: Option<&str>,
    ) -> Result<()> {
        let root_id = self.root.id();
        let mut detect_node = None;
        let mut index_node = None;
        let mut storage_node = None;

        for node in self.children.iter_mut() {
            if resource_detect == Some(node.id()) {
                detect_node = Some(node);
            } else if index_step == node.id() {
                index_node = Some(node);
            } else if second_storage == Some(node.id()) {
                storage_node = Some(node);
            }
        }

        if let Some(id) = resource_detect {
            if detect_node.is_none() {
                return Err(missing_step(root_id, id));
            }
        }
        if let Some(id) = second_storage {
            if storage_node.is_none() {
                return Err(missing_step(root_id, id));
            }
        }
        let index_node = index_node.ok_or_else(|| missing_step(root_id, index_step))?;

        if let Some(detect) = detect_node.as_deref() {
            let fanned_out = |id: &str| id == index_step || second_storage == Some(id);
            if let Some(stale) = detect.next_steps().iter().find(|id| !fanned_out(id.as_str())) {
                return Err(ModeljobError::DagEdge(format!(
                    "step '{}' already leads to '{stale}'",
                    detect.id()
                )));
            }
            ensure_free_or_following(index_node, detect.id())?;
            if let Some(storage) = storage_node.as_deref() {
                ensure_free_or_following(storage, detect.id())?;
            }
        }

        rewire::init_resource_detect_dag_node(detect_node, index_node, storage_node);
        Ok(())
    }

    /// Tree-level wrapper around [`rewire::connect`].
    pub fn connect(&mut self, upstream: &str, downstream: &str) -> Result<()> {
        if upstream == downstream {
            return Err(ModeljobError::DagEdge(format!(
                "step '{upstream}' cannot follow itself"
            )));
        }

        let root_id = self.root.id();
        let mut up = None;
        let mut down = None;
        for node in self.children.iter_mut() {
            if node.id() == upstream {
                up = Some(node);
            } else if node.id() == downstream {
                down = Some(node);
            }
        }

        match (up, down) {
            (Some(up), Some(down)) => {
                ensure_free_or_following(down, upstream)?;
                rewire::connect(up, down);
                Ok(())
            }
            (None, _) => Err(missing_step(root_id, upstream)),
            (_, None) => Err(missing_step(root_id, downstream)),
        }
    }

    pub fn into_parts(self) -> (ExecutableNode, Vec<ExecutableNode>) {
        (self.root, self.children)
    }
}

/// A step may only be wired under `upstream` if it follows nothing else yet.
fn ensure_free_or_following(step: &ExecutableNode, upstream: &str) -> Result<()> {
    match step.previous_step() {
        Some(existing) if existing != upstream => Err(ModeljobError::DagEdge(format!(
            "step '{}' already follows '{existing}'",
            step.id()
        ))),
        _ => Ok(()),
    }
}

fn missing_step(root_id: &str, id: &str) -> ModeljobError {
    ModeljobError::DagEdge(format!("step '{id}' is not part of job '{root_id}'"))
}
