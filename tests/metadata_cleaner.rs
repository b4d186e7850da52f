// tests/metadata_cleaner.rs

mod common;

use std::sync::Arc;

use common::{ConfigFileBuilder, ModelConfigBuilder, PROJECT, init_tracing};
use modeljob::errors::ModeljobError;
use modeljob::gc::{CleanupPhase, GarbageCollector, IndexCleaner, MetadataCleaner};
use modeljob::load_metadata;
use modeljob::metadata::{InMemoryMetadataStore, MetadataStore};
use modeljob::types::RealizationStatus;
use modeljob_test_utils::fakes::FailingCleaner;

fn store() -> Arc<InMemoryMetadataStore> {
    init_tracing();
    let cfg = ConfigFileBuilder::new()
        .with_model(
            "m1",
            ModelConfigBuilder::new(PROJECT)
                .layouts(&[1, 2])
                .tombstoned_layouts(&[3])
                .segment("s1", &[])
                .build(),
        )
        .build();
    let store = load_metadata(&cfg);
    store
        .transaction(PROJECT, &mut |meta| {
            let df = meta.dataflow_mut("m1").expect("dataflow exists");
            df.segments[0].layouts.extend([1, 3]);
            Ok(())
        })
        .unwrap();
    Arc::new(store)
}

#[test]
fn index_cleaner_removes_tombstoned_layouts_everywhere() {
    let store = store();
    let collector = GarbageCollector::new(store.clone());
    let mut cleaners: Vec<Box<dyn MetadataCleaner>> = vec![Box::new(IndexCleaner::new(PROJECT))];

    let report = collector.sweep(&mut cleaners).unwrap();

    assert_eq!(report.cleaners, vec!["index".to_string()]);
    assert_eq!(report.committed_transactions, 3);

    let plan = store.index_plan(PROJECT, "m1").unwrap().unwrap();
    assert_eq!(plan.all_layout_ids().into_iter().collect::<Vec<_>>(), vec![1, 2]);
    let df = store.dataflow(PROJECT, "m1").unwrap().unwrap();
    assert_eq!(df.segments[0].layouts.iter().copied().collect::<Vec<_>>(), vec![1]);
}

#[test]
fn index_cleaner_reports_removed_layouts_per_model() {
    let store = store();
    let mut meta = store.snapshot(PROJECT).unwrap();
    let mut cleaner = IndexCleaner::new(PROJECT);

    cleaner.before_cleanup(&mut meta).unwrap();
    assert!(cleaner.removed().is_empty());
    cleaner.cleanup(&mut meta).unwrap();
    cleaner.after_cleanup(&mut meta).unwrap();

    assert_eq!(cleaner.removed().len(), 1);
    assert_eq!(cleaner.removed()["m1"].iter().copied().collect::<Vec<_>>(), vec![3]);
    // Phases ran on a detached copy; the store itself is untouched.
    let plan = store.index_plan(PROJECT, "m1").unwrap().unwrap();
    assert_eq!(plan.all_layout_ids().into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);

    cleaner.before_cleanup(&mut meta).unwrap();
    assert!(cleaner.removed().is_empty());
}

#[test]
fn failure_in_cleanup_rolls_back_that_phase() {
    let store = store();
    let before = store.snapshot(PROJECT).unwrap();
    let collector = GarbageCollector::new(store.clone());
    let mut cleaners: Vec<Box<dyn MetadataCleaner>> =
        vec![Box::new(FailingCleaner::new(PROJECT, CleanupPhase::Cleanup))];

    let err = collector.sweep(&mut cleaners).unwrap_err();
    match err {
        ModeljobError::CleanupFailed { project, phase, .. } => {
            assert_eq!(project, PROJECT);
            assert_eq!(phase, CleanupPhase::Cleanup);
        }
        other => panic!("expected CleanupFailed, got {other:?}"),
    }

    let after = store.snapshot(PROJECT).unwrap();
    // The cleanup mutation never became visible.
    assert_eq!(after.index_plans, before.index_plans);
    // before_cleanup had already committed.
    assert_eq!(after.dataflows["m1"].status, RealizationStatus::Offline);
}

#[test]
fn failure_in_before_cleanup_leaves_metadata_unchanged() {
    let store = store();
    let before = store.snapshot(PROJECT).unwrap();
    let collector = GarbageCollector::new(store.clone());
    let mut cleaners: Vec<Box<dyn MetadataCleaner>> = vec![
        Box::new(FailingCleaner::new(PROJECT, CleanupPhase::BeforeCleanup)),
        Box::new(IndexCleaner::new(PROJECT)),
    ];

    assert!(collector.sweep(&mut cleaners).is_err());
    assert_eq!(store.snapshot(PROJECT).unwrap(), before);
}

#[test]
fn failure_in_prepare_runs_no_phase() {
    let store = store();
    let before = store.snapshot(PROJECT).unwrap();
    let collector = GarbageCollector::new(store.clone());
    let mut cleaners: Vec<Box<dyn MetadataCleaner>> = vec![
        Box::new(IndexCleaner::new(PROJECT)),
        Box::new(FailingCleaner::new(PROJECT, CleanupPhase::Prepare)),
    ];

    let err = collector.sweep(&mut cleaners).unwrap_err();
    assert!(matches!(
        err,
        ModeljobError::CleanupFailed {
            phase: CleanupPhase::Prepare,
            ..
        }
    ));
    assert_eq!(store.snapshot(PROJECT).unwrap(), before);
}

#[test]
fn cleaner_on_empty_project_is_harmless() {
    let store = Arc::new(InMemoryMetadataStore::new());
    let collector = GarbageCollector::new(store.clone());
    let mut cleaners: Vec<Box<dyn MetadataCleaner>> = vec![Box::new(IndexCleaner::new("empty"))];

    let report = collector.sweep(&mut cleaners).unwrap();
    assert_eq!(report.committed_transactions, 3);
}
