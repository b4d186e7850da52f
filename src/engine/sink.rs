// src/engine/sink.rs

//! Where lifecycle commands leave the engine.
//!
//! The runtime hands every batch of commands to a [`CommandSink`] instead of
//! a raw channel, so tests can swap in a sink that just records them.

use std::future::Future;
use std::pin::Pin;

use tokio::sync::mpsc;

use crate::engine::LifecycleCommand;
use crate::errors::{Error, Result};

pub trait CommandSink: Send {
    fn deliver(
        &mut self,
        commands: Vec<LifecycleCommand>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>>;
}

/// Forwards commands to the scheduler over an mpsc channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<LifecycleCommand>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<LifecycleCommand>) -> Self {
        Self { tx }
    }
}

impl CommandSink for ChannelSink {
    fn deliver(
        &mut self,
        commands: Vec<LifecycleCommand>,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + '_>> {
        // Clone the sender so the future doesn't borrow `self` across `await`.
        let tx = self.tx.clone();

        Box::pin(async move {
            for command in commands {
                tx.send(command).await.map_err(Error::from)?;
            }
            Ok(())
        })
    }
}
