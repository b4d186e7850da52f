// tests/lifecycle_engine.rs

mod common;

use common::{ConfigFileBuilder, Harness, JobConfigBuilder, ModelConfigBuilder, PROJECT};
use modeljob::config::{ConfigFile, EventKind};
use modeljob::engine::{
    LifecycleCommand, LifecycleCore, LifecycleEvent, Runtime, TerminationReason,
};
use modeljob::metadata::MetadataStore;
use modeljob::replay_events;
use modeljob::types::{JobStatus, JobType, RealizationStatus, SegmentStatus};
use modeljob_test_utils::fakes::RecordingSink;
use modeljob_test_utils::with_timeout;
use tokio::sync::mpsc;

fn config() -> ConfigFile {
    ConfigFileBuilder::new()
        .with_model(
            "m1",
            ModelConfigBuilder::new(PROJECT)
                .layouts(&[1])
                .segment("s1", &[])
                .segment_with_status("s2", SegmentStatus::New, &[])
                .build(),
        )
        .with_job(
            "inc",
            JobConfigBuilder::new(JobType::IncBuild, PROJECT, "m1")
                .segment("s2")
                .create_time(200)
                .status(JobStatus::Running)
                .build(),
        )
        .with_job(
            "index",
            JobConfigBuilder::new(JobType::IndexBuild, PROJECT, "m1")
                .segment("s1")
                .layouts(&[1])
                .create_time(100)
                .build(),
        )
        .with_event(EventKind::AdmissionCheck, "index")
        .with_event(EventKind::ValidityCheck, "index")
        .with_event(EventKind::ExecuteError, "inc")
        .with_event(EventKind::Discard, "inc")
        .build()
}

fn event(kind: fn(String, String) -> LifecycleEvent, job: &str) -> LifecycleEvent {
    kind(PROJECT.to_string(), job.to_string())
}

fn validity(project: String, job_id: String) -> LifecycleEvent {
    LifecycleEvent::ValidityCheck { project, job_id }
}

fn discarded(project: String, job_id: String) -> LifecycleEvent {
    LifecycleEvent::Discarded { project, job_id }
}

fn core(h: &Harness) -> LifecycleCore {
    LifecycleCore::new(h.executions.clone(), h.metadata.clone())
}

#[test]
fn validity_check_continues_valid_job() {
    let h = Harness::from_config(&config());
    let step = core(&h).step(event(validity, "index"));

    assert!(step.keep_running);
    assert_eq!(
        step.commands,
        vec![LifecycleCommand::Continue {
            job_id: "index".to_string()
        }]
    );
    assert_eq!(h.status("index"), Some(JobStatus::Ready));
}

#[test]
fn validity_check_terminates_job_whose_segments_vanished() {
    let h = Harness::from_config(&config());
    h.metadata
        .transaction(PROJECT, &mut |meta| {
            meta.dataflow_mut("m1").expect("dataflow exists").segments.clear();
            Ok(())
        })
        .unwrap();

    let mut core = core(&h);
    let step = core.step(event(validity, "index"));

    assert_eq!(
        step.commands,
        vec![LifecycleCommand::Terminate {
            job_id: "index".to_string(),
            reason: TerminationReason::Suicide,
        }]
    );
    assert_eq!(h.status("index"), Some(JobStatus::Suicidal));

    // A terminal job ignores further checks.
    assert!(core.step(event(validity, "index")).commands.is_empty());
}

#[test]
fn execute_error_after_suicide_keeps_terminal_status() {
    let h = Harness::from_config(&config());
    h.metadata
        .transaction(PROJECT, &mut |meta| {
            meta.dataflow_mut("m1").expect("dataflow exists").segments.clear();
            Ok(())
        })
        .unwrap();

    let mut core = core(&h);
    core.step(event(validity, "inc"));
    assert_eq!(h.status("inc"), Some(JobStatus::Suicidal));

    let step = core.step(LifecycleEvent::ExecuteError {
        project: PROJECT.to_string(),
        job_id: "inc".to_string(),
    });

    assert!(step.keep_running);
    assert!(step.commands.is_empty());
    assert_eq!(h.status("inc"), Some(JobStatus::Suicidal));
    // The error hook did not run for the terminated job.
    assert_eq!(h.dataflow("m1").status, RealizationStatus::Online);
}

#[test]
fn discard_runs_handler_once() {
    let h = Harness::from_config(&config());
    let mut core = core(&h);

    let step = core.step(event(discarded, "inc"));
    assert_eq!(
        step.commands,
        vec![LifecycleCommand::Terminate {
            job_id: "inc".to_string(),
            reason: TerminationReason::Discarded,
        }]
    );
    assert_eq!(h.status("inc"), Some(JobStatus::Discarded));
    // The add-segment handler dropped the uncommitted target segment.
    assert!(h.dataflow("m1").segment("s2").is_none());
    assert!(h.dataflow("m1").segment("s1").is_some());

    assert!(core.step(event(discarded, "inc")).commands.is_empty());
}

#[test]
fn unknown_jobs_are_ignored() {
    let h = Harness::from_config(&config());
    let step = core(&h).step(event(validity, "ghost"));

    assert!(step.keep_running);
    assert!(step.commands.is_empty());
}

#[test]
fn shutdown_stops_the_core() {
    let h = Harness::from_config(&config());
    let step = core(&h).step(LifecycleEvent::ShutdownRequested);
    assert!(!step.keep_running);
}

#[tokio::test]
async fn runtime_delivers_commands_to_sink() {
    let h = Harness::from_config(&config());
    let (tx, rx) = mpsc::channel(8);
    let runtime = Runtime::new(core(&h), rx, RecordingSink::new());

    tx.send(LifecycleEvent::AdmissionCheck {
        project: PROJECT.to_string(),
        job_id: "index".to_string(),
    })
    .await
    .unwrap();
    tx.send(LifecycleEvent::ExecuteError {
        project: PROJECT.to_string(),
        job_id: "inc".to_string(),
    })
    .await
    .unwrap();
    tx.send(LifecycleEvent::ShutdownRequested).await.unwrap();

    let sink = with_timeout(runtime.run()).await.unwrap();

    assert_eq!(
        sink.delivered(),
        vec![
            LifecycleCommand::Hold {
                job_id: "index".to_string()
            },
            LifecycleCommand::ErrorRecorded {
                job_id: "inc".to_string()
            },
        ]
    );
    assert_eq!(h.status("inc"), Some(JobStatus::Error));
    assert_eq!(h.dataflow("m1").status, RealizationStatus::LagBehind);
}

#[tokio::test]
async fn runtime_exits_when_channel_closes() {
    let h = Harness::from_config(&config());
    let (tx, rx) = mpsc::channel(1);
    drop(tx);

    let sink = with_timeout(Runtime::new(core(&h), rx, RecordingSink::new()).run())
        .await
        .unwrap();
    assert!(sink.delivered().is_empty());
}

#[tokio::test]
async fn replay_runs_configured_events_in_order() {
    let cfg = config();
    let h = Harness::from_config(&cfg);

    let commands = with_timeout(replay_events(
        &cfg,
        h.executions.clone(),
        h.metadata.clone(),
    ))
    .await
    .unwrap();

    assert_eq!(
        commands,
        vec![
            LifecycleCommand::Hold {
                job_id: "index".to_string()
            },
            LifecycleCommand::Continue {
                job_id: "index".to_string()
            },
            LifecycleCommand::ErrorRecorded {
                job_id: "inc".to_string()
            },
            LifecycleCommand::Terminate {
                job_id: "inc".to_string(),
                reason: TerminationReason::Discarded,
            },
        ]
    );
    assert_eq!(h.status("inc"), Some(JobStatus::Discarded));
}
