use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::core::{FrameBatch, Loop, LoopEvent};
use crate::engine::config::PipelineConfig;
use crate::observability::MetricsCollector;
use crate::stages::{align, detect_cycle, segment, EventNormalizer};

pub const STAGE_NORMALIZE: &str = "normalize";
pub const STAGE_DETECT: &str = "detect";
pub const STAGE_ALIGN: &str = "align";
pub const STAGE_SEGMENT: &str = "segment";

/// Which view a consumer wants rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DisplayMode {
    /// Every corrected frame, oldest first
    History,
    /// The reconstructed loop activations
    Loop,
}

/// Current reconstruction, replaced wholesale on every batch
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoopView {
    pub loops: Vec<Loop>,

    /// Aligned repeating unit the loops were cut from
    pub cycle: Vec<LoopEvent>,

    pub history_len: usize,
    pub observed_at: u64,
}

impl LoopView {
    /// False while there is not enough data for a repeat
    pub fn is_settled(&self) -> bool {
        !self.cycle.is_empty()
    }
}

/// What [`LoopPipeline::display`] hands to a renderer
#[derive(Debug, Clone, PartialEq)]
pub enum Display<'a> {
    History(&'a [LoopEvent]),
    Loops(&'a [Loop]),
}

/// Single-writer session over the append-only event history
pub struct LoopPipeline {
    config: PipelineConfig,
    normalizer: EventNormalizer,
    history: Vec<LoopEvent>,
    view: LoopView,
    metrics: MetricsCollector,
}

impl LoopPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let normalizer = EventNormalizer::new(config.sort_threshold, config.wrap_threshold_us);
        Self {
            config,
            normalizer,
            history: Vec::new(),
            view: LoopView::default(),
            metrics: MetricsCollector::with_stages(&[
                STAGE_NORMALIZE,
                STAGE_DETECT,
                STAGE_ALIGN,
                STAGE_SEGMENT,
            ]),
        }
    }

    pub fn from_json(config: Value) -> Result<Self> {
        Ok(Self::new(PipelineConfig::from_json(config)?))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn history(&self) -> &[LoopEvent] {
        &self.history
    }

    pub fn view(&self) -> &LoopView {
        &self.view
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn display(&self, mode: DisplayMode) -> Display<'_> {
        match mode {
            DisplayMode::History => Display::History(&self.history),
            DisplayMode::Loop => Display::Loops(&self.view.loops),
        }
    }

    /// Drop all history and the current view
    pub fn clear(&mut self) {
        self.history.clear();
        self.view = LoopView::default();
        debug!("pipeline history cleared");
    }

    /// Apply one batch in arrival order and rebuild the loop view.
    ///
    /// Returns `None` for an empty batch; nothing downstream runs and the
    /// previous view stays current.
    pub fn process_batch(&mut self, batch: FrameBatch) -> Option<&LoopView> {
        if batch.is_empty() {
            trace!("skipping empty batch");
            return None;
        }
        let observed_at = batch.arrival_monotonic_nanos;
        let batch_len = batch.len();

        timed(&self.metrics, STAGE_NORMALIZE, batch_len, || {
            self.normalizer.normalize(&mut self.history, batch.into_events())
        });
        self.enforce_history_limit();

        let sample_start = self.history.len().saturating_sub(self.config.sample_threshold);
        let sample = &self.history[sample_start..];
        let sample_len = sample.len();

        let cycle = timed(&self.metrics, STAGE_DETECT, sample_len, || detect_cycle(sample));
        if cycle.is_empty() {
            self.record_empty(STAGE_DETECT);
        }
        let aligned = timed(&self.metrics, STAGE_ALIGN, cycle.len(), || align(&cycle));
        let loops = timed(&self.metrics, STAGE_SEGMENT, aligned.len(), || {
            segment(&aligned, observed_at)
        });

        debug!(
            batch = batch_len,
            history = self.history.len(),
            period = aligned.len(),
            loops = loops.len(),
            "rebuilt loop view"
        );

        self.view = LoopView {
            loops,
            cycle: aligned,
            history_len: self.history.len(),
            observed_at,
        };
        Some(&self.view)
    }

    fn record_empty(&self, stage: &str) {
        if let Some(metrics) = self.metrics.get_stage_metrics(stage) {
            metrics.record_empty();
        }
    }

    fn enforce_history_limit(&mut self) {
        if let Some(limit) = self.config.history_limit {
            if self.history.len() > limit {
                let excess = self.history.len() - limit;
                self.history.drain(..excess);
                trace!(dropped = excess, "history capped");
            }
        }
    }
}

fn timed<T>(metrics: &MetricsCollector, stage: &str, events: usize, f: impl FnOnce() -> T) -> T {
    let stage_metrics = metrics.get_stage_metrics(stage);
    let start = stage_metrics.as_ref().map(|m| m.start_processing());
    let output = f();
    if let (Some(m), Some(start)) = (stage_metrics, start) {
        m.finish_processing(start);
        m.record_batch(events);
    }
    output
}
