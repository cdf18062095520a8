use anyhow::{anyhow, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::capture::{capture_channel, CaptureSender, FrameSource};
use crate::core::FrameBatch;
use crate::engine::async_pipeline::AsyncLoopPipeline;
use crate::engine::config::PipelineConfig;
use crate::engine::pipeline::LoopView;
use crate::observability::PipelineMonitor;

/// Runtime status enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuntimeStatus {
    Stopped,
    Running,
    Error,
}

/// Connects one frame feed to the loop pipeline.
///
/// Exactly one feed may be attached at a time: batches reach the pipeline in
/// the order that feed produced them, which the rollover correction needs.
pub struct ObserveRuntime {
    pipeline: AsyncLoopPipeline,
    status: RuntimeStatus,
    shutdown_tx: Option<broadcast::Sender<()>>,
    feed_handle: Option<JoinHandle<Result<()>>>,
}

impl ObserveRuntime {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            pipeline: AsyncLoopPipeline::new(config),
            status: RuntimeStatus::Stopped,
            shutdown_tx: None,
            feed_handle: None,
        }
    }

    pub fn status(&self) -> RuntimeStatus {
        self.status
    }

    pub fn has_feed(&self) -> bool {
        self.feed_handle.is_some()
    }

    pub fn start(&mut self) -> Result<()> {
        if self.status == RuntimeStatus::Running {
            return Err(anyhow!("Runtime is already running"));
        }
        if let Err(e) = self.pipeline.start() {
            self.status = RuntimeStatus::Error;
            return Err(e);
        }
        let (shutdown_tx, _) = broadcast::channel(16);
        self.shutdown_tx = Some(shutdown_tx);
        self.status = RuntimeStatus::Running;
        info!("observe runtime started");
        Ok(())
    }

    /// Hand out a sender for a synchronous capture callback and start
    /// forwarding whatever it delivers
    pub fn open_capture(&mut self, capacity: usize) -> Result<CaptureSender> {
        let (sender, rx) = capture_channel(capacity);
        self.attach_capture(rx)?;
        Ok(sender)
    }

    /// Forward batches from a crossbeam queue filled outside the async world
    pub fn attach_capture(&mut self, rx: Receiver<FrameBatch>) -> Result<()> {
        let (inbox, mut shutdown_rx) = self.claim_feed()?;

        let handle = tokio::spawn(async move {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    // Batches the callback already handed over still count
                    let pending: Vec<FrameBatch> = rx.try_iter().collect();
                    if !pending.is_empty() {
                        debug!(batches = pending.len(), "draining capture queue");
                    }
                    for batch in pending {
                        if inbox.send(batch).await.is_err() {
                            warn!("pipeline inbox closed, capture feed stopping");
                            break;
                        }
                    }
                    break;
                }
                match rx.try_recv() {
                    Ok(batch) => {
                        if inbox.send(batch).await.is_err() {
                            warn!("pipeline inbox closed, capture feed stopping");
                            break;
                        }
                    }
                    Err(TryRecvError::Empty) => {
                        tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
                    }
                    Err(TryRecvError::Disconnected) => {
                        debug!("capture sender dropped");
                        break;
                    }
                }
            }
            Ok(())
        });

        self.feed_handle = Some(handle);
        Ok(())
    }

    /// Pull batches from an async source until it runs dry or shutdown
    pub fn attach_source(&mut self, mut source: Box<dyn FrameSource>) -> Result<()> {
        let (inbox, mut shutdown_rx) = self.claim_feed()?;

        let handle = tokio::spawn(async move {
            source.start().await?;
            loop {
                let next = tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    next = source.next_batch() => next,
                };
                match next {
                    Ok(Some(batch)) => {
                        if inbox.send(batch).await.is_err() {
                            warn!("pipeline inbox closed, source feed stopping");
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("frame source exhausted");
                        break;
                    }
                    Err(e) => {
                        source.stop().await?;
                        return Err(e);
                    }
                }
            }
            source.stop().await
        });

        self.feed_handle = Some(handle);
        Ok(())
    }

    /// Wait for the attached feed to finish on its own
    pub async fn join_feed(&mut self) -> Result<()> {
        match self.feed_handle.take() {
            Some(handle) => handle.await?,
            None => Ok(()),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Arc<LoopView>> {
        self.pipeline.subscribe()
    }

    pub fn latest(&self) -> Arc<LoopView> {
        self.pipeline.latest()
    }

    pub fn get_monitor(&self) -> Option<PipelineMonitor> {
        self.pipeline.get_monitor()
    }

    /// Gracefully shutdown: stop the feed, then drain the pipeline
    pub async fn shutdown(&mut self) -> Result<()> {
        if self.status == RuntimeStatus::Stopped {
            return Ok(());
        }

        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(());
        }
        if let Some(handle) = self.feed_handle.take() {
            match handle.await {
                Ok(Err(e)) => warn!("frame feed ended with error: {}", e),
                Err(e) => warn!("frame feed task failed: {}", e),
                Ok(Ok(())) => {}
            }
        }

        self.pipeline.stop().await?;
        self.shutdown_tx = None;
        self.status = RuntimeStatus::Stopped;
        info!("observe runtime stopped");
        Ok(())
    }

    fn claim_feed(&self) -> Result<(mpsc::Sender<FrameBatch>, broadcast::Receiver<()>)> {
        if self.status != RuntimeStatus::Running {
            return Err(anyhow!("Runtime is not running"));
        }
        if self.feed_handle.as_ref().is_some_and(|h| !h.is_finished()) {
            return Err(anyhow!("A frame feed is already attached"));
        }
        let inbox = self.pipeline.sender().ok_or(anyhow!("Pipeline inbox unavailable"))?;
        let shutdown_rx = self
            .shutdown_tx
            .as_ref()
            .map(|tx| tx.subscribe())
            .ok_or(anyhow!("Runtime has no shutdown channel"))?;
        Ok((inbox, shutdown_rx))
    }
}

/// Send a shutdown signal if the runtime is dropped while running.
/// Feeds stop, but the pipeline is not drained; call `shutdown()` for that.
impl Drop for ObserveRuntime {
    fn drop(&mut self) {
        if let Some(tx) = &self.shutdown_tx {
            let _ = tx.send(());
        }
    }
}
