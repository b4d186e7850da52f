// tests/dag_rewire.rs

mod common;

use std::collections::HashSet;
use std::sync::Arc;

use modeljob::dag::{
    ExecutableNode, ExecutableTree, JobPlanner, PlanOptions, StepKind, connect, execution_order,
    init_resource_detect_dag_node, validate_tree,
};
use modeljob::errors::ModeljobError;
use modeljob::metadata::InMemoryMetadataStore;
use modeljob::types::JobType;

fn node(id: &str) -> ExecutableNode {
    ExecutableNode::new(id, JobType::IncBuild, common::PROJECT)
}

fn ids(values: &[&str]) -> HashSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

fn ids_of(values: &[&String]) -> HashSet<String> {
    values.iter().map(|s| s.to_string()).collect()
}

#[test]
fn absent_resource_detect_leaves_edges_untouched() {
    let mut index = node("index");
    let mut storage = node("storage");

    init_resource_detect_dag_node(None, &mut index, Some(&mut storage));

    assert_eq!(index.previous_step(), None);
    assert_eq!(storage.previous_step(), None);
    assert!(index.next_steps().is_empty());
}

#[test]
fn resource_detect_fans_out_to_index_and_second_storage() {
    let mut detect = node("detect");
    let mut index = node("index");
    let mut storage = node("storage");

    init_resource_detect_dag_node(Some(&mut detect), &mut index, Some(&mut storage));

    assert_eq!(detect.next_steps(), &ids(&["index", "storage"]));
    assert_eq!(index.previous_step(), Some("detect"));
    assert_eq!(storage.previous_step(), Some("detect"));
}

#[test]
fn resource_detect_without_second_storage_leads_to_index_only() {
    let mut detect = node("detect");
    let mut index = node("index");

    init_resource_detect_dag_node(Some(&mut detect), &mut index, None);

    assert_eq!(detect.next_steps(), &ids(&["index"]));
    assert_eq!(index.previous_step(), Some("detect"));
}

#[test]
fn connect_writes_both_sides() {
    let mut up = node("up");
    let mut down = node("down");

    connect(&mut up, &mut down);

    assert_eq!(up.next_steps(), &ids(&["down"]));
    assert_eq!(down.previous_step(), Some("up"));
}

fn tree_with_steps(kinds: &[StepKind]) -> (ExecutableTree, Vec<String>) {
    let mut tree = ExecutableTree::new(node("j1").with_target_segments(["s1"]));
    let ids = kinds.iter().map(|k| tree.add_step(*k)).collect();
    (tree, ids)
}

#[test]
fn tree_steps_are_numbered_and_parented() {
    let (tree, ids) = tree_with_steps(&[StepKind::ResourceDetect, StepKind::BuildLayouts]);

    assert_eq!(ids, vec!["j1_00".to_string(), "j1_01".to_string()]);
    for step in tree.children() {
        assert_eq!(step.parent_id(), Some("j1"));
        assert_eq!(step.job_type(), JobType::IncBuild);
    }
    assert_eq!(tree.target_segments(), &["s1".to_string()]);
}

#[test]
fn tree_connect_rejects_unknown_and_self_edges() {
    let (mut tree, ids) = tree_with_steps(&[StepKind::BuildLayouts]);

    assert!(matches!(
        tree.connect(&ids[0], &ids[0]),
        Err(ModeljobError::DagEdge(_))
    ));
    assert!(matches!(
        tree.connect(&ids[0], "ghost"),
        Err(ModeljobError::DagEdge(msg)) if msg.contains("ghost")
    ));
    assert!(matches!(
        tree.init_resource_detect_dag_node(Some("ghost"), &ids[0], None),
        Err(ModeljobError::DagEdge(_))
    ));
}

#[test]
fn tree_connect_refuses_second_upstream() {
    let (mut tree, ids) = tree_with_steps(&[
        StepKind::BuildLayouts,
        StepKind::SecondStorage,
        StepKind::UpdateMetadata,
    ]);

    tree.connect(&ids[0], &ids[2]).unwrap();
    assert!(tree.connect(&ids[1], &ids[2]).is_err());

    // The rejected edge left no half-written state behind.
    assert!(tree.step(&ids[1]).unwrap().next_steps().is_empty());
    validate_tree(&tree).unwrap();
}

#[test]
fn tree_resource_detect_refuses_to_strand_existing_downstream() {
    let (mut tree, ids) = tree_with_steps(&[
        StepKind::ResourceDetect,
        StepKind::SecondStorage,
        StepKind::BuildLayouts,
    ]);
    tree.connect(&ids[0], &ids[1]).unwrap();

    let result = tree.init_resource_detect_dag_node(Some(&ids[0]), &ids[2], None);

    assert!(matches!(
        result,
        Err(ModeljobError::DagEdge(msg)) if msg.contains(&ids[1])
    ));
    assert_eq!(tree.step(&ids[0]).unwrap().next_steps(), &ids_of(&[&ids[1]]));
    assert_eq!(tree.step(&ids[2]).unwrap().previous_step(), None);
    validate_tree(&tree).unwrap();
}

#[test]
fn tree_resource_detect_refuses_targets_following_another_step() {
    let kinds = [
        StepKind::ResourceDetect,
        StepKind::UpdateMetadata,
        StepKind::BuildLayouts,
        StepKind::SecondStorage,
    ];

    let (mut tree, ids) = tree_with_steps(&kinds);
    tree.connect(&ids[1], &ids[2]).unwrap();
    assert!(matches!(
        tree.init_resource_detect_dag_node(Some(&ids[0]), &ids[2], None),
        Err(ModeljobError::DagEdge(msg)) if msg.contains(&ids[1])
    ));
    assert!(tree.step(&ids[0]).unwrap().next_steps().is_empty());
    validate_tree(&tree).unwrap();

    let (mut tree, ids) = tree_with_steps(&kinds);
    tree.connect(&ids[1], &ids[3]).unwrap();
    assert!(matches!(
        tree.init_resource_detect_dag_node(Some(&ids[0]), &ids[2], Some(&ids[3])),
        Err(ModeljobError::DagEdge(_))
    ));
    assert!(tree.step(&ids[0]).unwrap().next_steps().is_empty());
    assert_eq!(tree.step(&ids[2]).unwrap().previous_step(), None);
    validate_tree(&tree).unwrap();
}

#[test]
fn tree_resource_detect_can_be_wired_twice() {
    let (mut tree, ids) = tree_with_steps(&[
        StepKind::ResourceDetect,
        StepKind::BuildLayouts,
        StepKind::SecondStorage,
    ]);

    tree.init_resource_detect_dag_node(Some(&ids[0]), &ids[1], Some(&ids[2]))
        .unwrap();
    tree.init_resource_detect_dag_node(Some(&ids[0]), &ids[1], Some(&ids[2]))
        .unwrap();

    assert_eq!(tree.step(&ids[0]).unwrap().next_steps(), &ids_of(&[&ids[1], &ids[2]]));
    validate_tree(&tree).unwrap();
}

#[test]
fn duplicate_pushed_step_is_rejected() {
    let (mut tree, ids) = tree_with_steps(&[StepKind::BuildLayouts]);
    let dup = node(&ids[0]);
    assert!(matches!(tree.push_step(dup), Err(ModeljobError::DagEdge(_))));

    tree.push_step(node("extra")).unwrap();
    assert_eq!(tree.step("extra").unwrap().parent_id(), Some("j1"));
}

fn planner(options: PlanOptions) -> JobPlanner {
    JobPlanner::new(options, Arc::new(InMemoryMetadataStore::new()))
}

fn build_root() -> ExecutableNode {
    node("j1")
        .with_target_subject("m1")
        .with_target_segments(["s1"])
        .with_layouts(&[1, 2])
        .with_create_time(42)
}

#[test]
fn planner_wires_resource_detect_ahead_of_build() {
    let tree = planner(PlanOptions::default()).plan(build_root()).unwrap();

    let detect = tree.step_of_kind(StepKind::ResourceDetect).unwrap();
    let build = tree.step_of_kind(StepKind::BuildLayouts).unwrap();
    let update = tree.step_of_kind(StepKind::UpdateMetadata).unwrap();
    assert!(tree.step_of_kind(StepKind::SecondStorage).is_none());

    assert_eq!(build.previous_step(), Some(detect.id()));
    assert_eq!(update.previous_step(), Some(build.id()));
    assert_eq!(
        execution_order(&tree).unwrap(),
        vec![detect.id().to_string(), build.id().to_string(), update.id().to_string()]
    );

    // Steps share the root's identity.
    assert_eq!(build.target_subject(), Some("m1"));
    assert_eq!(build.param("layout_ids"), Some("1,2"));
    assert_eq!(build.create_time(), 42);
    assert!(build.target_segments().is_empty());
}

#[test]
fn planner_fans_out_second_storage() {
    let options = PlanOptions {
        resource_detect: true,
        second_storage: true,
    };
    let tree = planner(options).plan(build_root()).unwrap();

    let detect = tree.step_of_kind(StepKind::ResourceDetect).unwrap();
    let build = tree.step_of_kind(StepKind::BuildLayouts).unwrap();
    let storage = tree.step_of_kind(StepKind::SecondStorage).unwrap();

    assert_eq!(
        detect.next_steps(),
        &[build.id().to_string(), storage.id().to_string()]
            .into_iter()
            .collect::<HashSet<_>>()
    );
    assert_eq!(storage.previous_step(), Some(detect.id()));
}

#[test]
fn planner_without_resource_detect_starts_at_build() {
    let options = PlanOptions {
        resource_detect: false,
        second_storage: true,
    };
    let tree = planner(options).plan(build_root()).unwrap();

    assert!(tree.step_of_kind(StepKind::ResourceDetect).is_none());
    let build = tree.step_of_kind(StepKind::BuildLayouts).unwrap();
    let storage = tree.step_of_kind(StepKind::SecondStorage).unwrap();
    assert_eq!(build.previous_step(), None);
    assert_eq!(storage.previous_step(), None);
}

#[test]
fn planner_uses_job_specific_steps() {
    let merge = ExecutableNode::new("m", JobType::IndexMerge, common::PROJECT)
        .with_target_subject("m1")
        .with_target_segments(["s1", "s2"]);
    let tree = planner(PlanOptions::default()).plan(merge).unwrap();
    assert!(tree.step_of_kind(StepKind::MergeSegments).is_some());
    assert!(tree.step_of_kind(StepKind::BuildLayouts).is_none());

    let sampling = ExecutableNode::new("t", JobType::TableSampling, common::PROJECT);
    let tree = planner(PlanOptions::default()).plan(sampling).unwrap();
    assert_eq!(tree.children().len(), 1);
    assert_eq!(tree.children()[0].step_kind(), Some(StepKind::TableSampling));

    let snapshot = ExecutableNode::new("s", JobType::SnapshotRefresh, common::PROJECT);
    let tree = planner(PlanOptions::default()).plan(snapshot).unwrap();
    assert_eq!(tree.children()[0].step_kind(), Some(StepKind::BuildSnapshot));
}

#[test]
fn planner_attaches_segment_handler_to_segment_adding_jobs() {
    let p = planner(PlanOptions::default());
    assert!(p.plan(build_root()).unwrap().root().handler().is_some());

    let index = ExecutableNode::new("i", JobType::IndexBuild, common::PROJECT)
        .with_target_subject("m1")
        .with_target_segments(["s1"]);
    assert!(p.plan(index).unwrap().root().handler().is_none());
}
