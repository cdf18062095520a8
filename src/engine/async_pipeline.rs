use anyhow::{anyhow, Result};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::FrameBatch;
use crate::engine::config::PipelineConfig;
use crate::engine::pipeline::{LoopPipeline, LoopView};
use crate::engine::state::PipelineState;
use crate::observability::{MetricsCollector, PipelineMonitor};

/// Runs a [`LoopPipeline`] on one task so batches are applied strictly in
/// submission order, and publishes every rebuilt view.
pub struct AsyncLoopPipeline {
    config: PipelineConfig,
    inbox: Option<mpsc::Sender<FrameBatch>>,
    views_tx: Arc<watch::Sender<Arc<LoopView>>>,
    views_rx: watch::Receiver<Arc<LoopView>>,
    handle: Option<JoinHandle<u64>>,
    metrics_collector: Option<MetricsCollector>,
    state: PipelineState,
}

impl AsyncLoopPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let (views_tx, views_rx) = watch::channel(Arc::new(LoopView::default()));
        Self {
            config,
            inbox: None,
            views_tx: Arc::new(views_tx),
            views_rx,
            handle: None,
            metrics_collector: None,
            state: PipelineState::Idle,
        }
    }

    pub fn from_json(config: Value) -> Result<Self> {
        Ok(Self::new(PipelineConfig::from_json(config)?))
    }

    pub fn state(&self) -> &PipelineState {
        &self.state
    }

    /// Transition to a new state with validation
    pub fn transition_to(&mut self, new_state: PipelineState) -> Result<()> {
        if !self.state.can_transition_to(&new_state) {
            return Err(anyhow!(
                "Invalid state transition: {} -> {}",
                self.state.name(),
                new_state.name()
            ));
        }
        self.state = new_state;
        Ok(())
    }

    /// Spawn the pipeline task. A completed or recoverably failed pipeline
    /// goes back through `Idle` and starts over with an empty history.
    pub fn start(&mut self) -> Result<()> {
        if matches!(
            self.state,
            PipelineState::Completed { .. } | PipelineState::Error { recoverable: true, .. }
        ) {
            self.transition_to(PipelineState::Idle)?;
        }
        self.transition_to(PipelineState::Running {
            start_time: Some(std::time::Instant::now()),
        })?;

        let (tx, mut rx) = mpsc::channel::<FrameBatch>(self.config.channel_capacity);
        let mut pipeline = LoopPipeline::new(self.config.clone());
        self.metrics_collector = Some(pipeline.metrics().clone());
        let views_tx = self.views_tx.clone();

        let handle = tokio::spawn(async move {
            let mut batches = 0u64;
            while let Some(batch) = rx.recv().await {
                batches += 1;
                if let Some(view) = pipeline.process_batch(batch) {
                    // Nobody listening is fine; the latest view stays readable
                    let _ = views_tx.send(Arc::new(view.clone()));
                }
            }
            debug!(batches, "loop pipeline inbox closed");
            batches
        });

        self.inbox = Some(tx);
        self.handle = Some(handle);
        Ok(())
    }

    /// Queue a batch, waiting for inbox space
    pub async fn submit(&self, batch: FrameBatch) -> Result<()> {
        let inbox = self.inbox.as_ref().ok_or(anyhow!("Pipeline is not running"))?;
        inbox
            .send(batch)
            .await
            .map_err(|_| anyhow!("Failed to submit frame batch"))
    }

    /// Queue a batch without waiting; fails when the inbox is full
    pub fn try_submit(&self, batch: FrameBatch) -> Result<()> {
        let inbox = self.inbox.as_ref().ok_or(anyhow!("Pipeline is not running"))?;
        inbox.try_send(batch).map_err(|e| match e {
            mpsc::error::TrySendError::Full(batch) => {
                warn!(frames = batch.len(), "pipeline inbox full, batch dropped");
                anyhow!("Pipeline inbox full")
            }
            mpsc::error::TrySendError::Closed(_) => anyhow!("Pipeline inbox closed"),
        })
    }

    /// Handle for the inbox, for feeding batches from another task
    pub fn sender(&self) -> Option<mpsc::Sender<FrameBatch>> {
        self.inbox.clone()
    }

    /// Receiver that sees every view the pipeline publishes
    pub fn subscribe(&self) -> watch::Receiver<Arc<LoopView>> {
        self.views_rx.clone()
    }

    pub fn latest(&self) -> Arc<LoopView> {
        self.views_rx.borrow().clone()
    }

    /// Close the inbox, drain what was queued and wait for the task
    pub async fn stop(&mut self) -> Result<()> {
        let start_time = match &self.state {
            PipelineState::Running { start_time } => *start_time,
            _ => return Ok(()),
        };

        drop(self.inbox.take());

        let total_batches = match self.handle.take() {
            Some(handle) => match handle.await {
                Ok(batches) => batches,
                Err(e) => {
                    self.transition_to(PipelineState::Error {
                        error_msg: e.to_string(),
                        recoverable: true,
                    })?;
                    return Err(anyhow!("Loop pipeline task failed: {}", e));
                }
            },
            None => 0,
        };

        self.transition_to(PipelineState::Completed {
            duration: start_time.map(|t| t.elapsed()),
            total_batches,
        })
    }

    pub fn get_monitor(&self) -> Option<PipelineMonitor> {
        self.metrics_collector.clone().map(PipelineMonitor::new)
    }
}
