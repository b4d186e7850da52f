// src/engine/mod.rs

//! Lifecycle engine.
//!
//! A scheduler reports job transitions as [`LifecycleEvent`]s. The engine
//! routes them to the validity checks and lifecycle hooks of the job and
//! answers with [`LifecycleCommand`]s telling the scheduler what to do.
//!
//! The synchronous, deterministic core lives in [`core`]; the async shell
//! that reads events from a channel is in [`runtime`], and [`sink`] is where
//! commands leave the engine.

use crate::dag::JobId;

/// Transition reported by the scheduler for a job in `project`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    /// The job (or one of its steps) failed.
    ExecuteError { project: String, job_id: JobId },
    /// The job was discarded from outside.
    Discarded { project: String, job_id: JobId },
    /// Periodic probe: is the job still meaningful?
    ValidityCheck { project: String, job_id: JobId },
    /// The scheduler wants to start the job.
    AdmissionCheck { project: String, job_id: JobId },
    /// Graceful shutdown requested (e.g. Ctrl-C).
    ShutdownRequested,
}

/// Why the engine terminated a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationReason {
    Discarded,
    Suicide,
}

/// Decision handed back to the scheduler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleCommand {
    /// Stop the job; its handler already ran.
    Terminate {
        job_id: JobId,
        reason: TerminationReason,
    },
    /// The failure was recorded and the error hook ran.
    ErrorRecorded { job_id: JobId },
    /// The job is still valid; keep going.
    Continue { job_id: JobId },
    /// Another job is cutting in on the same model; keep this one queued.
    Hold { job_id: JobId },
    /// Nothing is cutting in; the job may start.
    Admit { job_id: JobId },
}

pub mod core;
pub mod runtime;
pub mod sink;

pub use self::core::{CoreStep, LifecycleCore};
pub use runtime::Runtime;
pub use sink::{ChannelSink, CommandSink};
