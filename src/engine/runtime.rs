// src/engine/runtime.rs

use std::fmt;

use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::errors::Result;

use super::core::LifecycleCore;
use super::sink::CommandSink;
use super::LifecycleEvent;

/// Async shell around [`LifecycleCore`].
///
/// Reads events from `event_rx`, feeds them into the core one at a time and
/// hands the resulting commands to the sink. All lifecycle semantics live in
/// the core.
pub struct Runtime<S: CommandSink> {
    core: LifecycleCore,
    event_rx: mpsc::Receiver<LifecycleEvent>,
    sink: S,
}

impl<S: CommandSink> fmt::Debug for Runtime<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("core", &self.core)
            .finish_non_exhaustive()
    }
}

impl<S: CommandSink> Runtime<S> {
    pub fn new(core: LifecycleCore, event_rx: mpsc::Receiver<LifecycleEvent>, sink: S) -> Self {
        Self {
            core,
            event_rx,
            sink,
        }
    }

    /// Main event loop. Returns the sink once the channel closes or the
    /// core asks to stop.
    pub async fn run(mut self) -> Result<S> {
        info!("lifecycle runtime started");

        while let Some(event) = self.event_rx.recv().await {
            debug!(?event, "runtime received event");

            let step = self.core.step(event);
            if !step.commands.is_empty() {
                self.sink.deliver(step.commands).await?;
            }

            if !step.keep_running {
                info!("core requested exit; stopping runtime");
                break;
            }
        }

        info!("lifecycle runtime exiting");
        Ok(self.sink)
    }
}
