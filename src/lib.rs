// src/lib.rs

pub mod cli;
pub mod config;
pub mod dag;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod gc;
pub mod logging;
pub mod metadata;
pub mod types;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::cli::{CliArgs, Command};
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::dag::{ExecutableTree, JobPlanner, execution_order};
use crate::engine::{ChannelSink, LifecycleCommand, LifecycleCore, LifecycleEvent, Runtime};
use crate::errors::ModeljobError;
use crate::exec::{ExecutableOnModel, ExecutionManager, InMemoryExecutionManager};
use crate::gc::{GarbageCollector, IndexCleaner, MetadataCleaner};
use crate::metadata::{InMemoryMetadataStore, MetadataStore};

/// High-level entry point used by `main.rs`.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let metadata: Arc<dyn MetadataStore> = Arc::new(load_metadata(&cfg));

    match args.command {
        Command::Plan => {
            let trees = plan_jobs(&cfg, Arc::clone(&metadata))?;
            print_plans(&trees)?;
        }
        Command::Check { job } => {
            let executions = submit_jobs(&cfg, Arc::clone(&metadata))?;
            print_verdicts(&cfg, &executions, metadata.as_ref(), job.as_deref())?;
        }
        Command::Replay => {
            let executions: Arc<dyn ExecutionManager> =
                Arc::new(submit_jobs(&cfg, Arc::clone(&metadata))?);
            let commands = replay_events(&cfg, Arc::clone(&executions), metadata).await?;
            print_replay(&cfg, &commands, executions.as_ref());
        }
        Command::Gc { project } => {
            let before = metadata.snapshot(&project)?;
            let collector = GarbageCollector::new(Arc::clone(&metadata));
            let mut cleaners: Vec<Box<dyn MetadataCleaner>> =
                vec![Box::new(IndexCleaner::new(project.clone()))];
            let report = collector.sweep(&mut cleaners)?;
            let after = metadata.snapshot(&project)?;

            println!("gc project {project}");
            println!("  cleaners: {:?}", report.cleaners);
            println!("  committed transactions: {}", report.committed_transactions);
            for (model, plan) in &after.index_plans {
                let was = before
                    .index_plans
                    .get(model)
                    .map(|p| p.layouts.len())
                    .unwrap_or_default();
                println!("  {model}: {} -> {} layouts", was, plan.layouts.len());
            }
        }
    }

    Ok(())
}

/// Build the in-memory metadata store described by the `[model.*]` sections.
pub fn load_metadata(cfg: &ConfigFile) -> InMemoryMetadataStore {
    let store = InMemoryMetadataStore::new();
    for (id, model) in &cfg.model {
        store.put_dataflow(&model.project, model.to_dataflow(id));
        if let Some(plan) = model.to_index_plan(id) {
            store.put_index_plan(&model.project, plan);
        }
    }
    debug!(models = cfg.model.len(), "metadata loaded from config");
    store
}

/// Plan every `[job.*]` section, in job id order.
pub fn plan_jobs(cfg: &ConfigFile, metadata: Arc<dyn MetadataStore>) -> Result<Vec<ExecutableTree>> {
    let planner = JobPlanner::new(cfg.config.plan_options(), metadata);
    let mut trees = Vec::with_capacity(cfg.job.len());
    for (id, job) in &cfg.job {
        let options = job.plan_options(planner.options());
        trees.push(planner.plan_with(job.to_root_node(id), options)?);
    }
    Ok(trees)
}

/// Plan every job and submit it with the status from its config.
pub fn submit_jobs(
    cfg: &ConfigFile,
    metadata: Arc<dyn MetadataStore>,
) -> Result<InMemoryExecutionManager> {
    let executions = InMemoryExecutionManager::new();
    for tree in plan_jobs(cfg, metadata)? {
        let status = cfg
            .job
            .get(tree.root().id())
            .map(|job| job.status)
            .unwrap_or_default();
        executions.submit(tree, status)?;
    }
    info!(jobs = cfg.job.len(), "jobs submitted");
    Ok(executions)
}

/// Run the configured events through the lifecycle runtime and collect the
/// commands it emits, in order.
pub async fn replay_events(
    cfg: &ConfigFile,
    executions: Arc<dyn ExecutionManager>,
    metadata: Arc<dyn MetadataStore>,
) -> Result<Vec<LifecycleCommand>> {
    let capacity = cfg.config.event_queue_length;
    let (event_tx, event_rx) = mpsc::channel::<LifecycleEvent>(capacity);
    let (command_tx, mut command_rx) = mpsc::channel::<LifecycleCommand>(capacity);

    let core = LifecycleCore::new(executions, metadata);
    let runtime = Runtime::new(core, event_rx, ChannelSink::new(command_tx));
    // Drop the sink when the loop ends so the command stream closes.
    let runtime_handle = tokio::spawn(async move { runtime.run().await.map(drop) });

    let events = cfg.lifecycle_events();
    info!(events = events.len(), "replaying lifecycle events");
    let feeder = tokio::spawn(async move {
        for event in events {
            if event_tx.send(event).await.is_err() {
                break;
            }
        }
    });

    let mut commands = Vec::new();
    while let Some(command) = command_rx.recv().await {
        commands.push(command);
    }

    feeder.await?;
    runtime_handle.await??;
    Ok(commands)
}

fn print_plans(trees: &[ExecutableTree]) -> Result<()> {
    println!("modeljob plan");
    for tree in trees {
        let root = tree.root();
        println!(
            "  {} ({}, model {})",
            root.id(),
            root.job_type(),
            root.target_subject().unwrap_or("-")
        );
        for step_id in execution_order(tree)? {
            let Some(step) = tree.step(&step_id) else {
                continue;
            };
            let kind = step
                .step_kind()
                .map(|k| k.to_string())
                .unwrap_or_default();
            match step.previous_step() {
                Some(prev) => println!("    {step_id} [{kind}] after {prev}"),
                None => println!("    {step_id} [{kind}]"),
            }
        }
    }
    Ok(())
}

fn print_verdicts(
    cfg: &ConfigFile,
    executions: &InMemoryExecutionManager,
    metadata: &dyn MetadataStore,
    only: Option<&str>,
) -> Result<()> {
    let ids: Vec<&String> = match only {
        Some(id) => {
            let (key, _) = cfg
                .job
                .get_key_value(id)
                .ok_or_else(|| ModeljobError::JobNotFound(id.to_string()))?;
            vec![key]
        }
        None => cfg.job.keys().collect(),
    };

    for id in ids {
        let Some(job) = cfg.job.get(id) else {
            continue;
        };
        let node = executions
            .job(&job.project, id)
            .ok_or_else(|| ModeljobError::JobNotFound(id.clone()))?;
        let view = ExecutableOnModel::new(&node, executions, metadata);
        let verdict = if view.check_suicide() { "suicide" } else { "valid" };
        println!("{id}\t{verdict}");
    }
    Ok(())
}

fn print_replay(cfg: &ConfigFile, commands: &[LifecycleCommand], executions: &dyn ExecutionManager) {
    println!("commands ({}):", commands.len());
    for command in commands {
        println!("  {command:?}");
    }

    println!("final statuses:");
    for (id, job) in &cfg.job {
        let status = executions
            .status_of(&job.project, id)
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("  {id}: {status}");
    }
}
