use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::{sleep, Duration, Instant};

use super::{FrameSource, SourceState};
use crate::core::{FrameBatch, FrameType, RawFrame};

/// One step of the simulated reader's polling loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternFrame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    #[serde(default)]
    pub data: Vec<u8>,
    /// Reader clock advance before this frame
    pub gap_us: u64,
    #[serde(default)]
    pub vendor_gain: u8,
}

impl PatternFrame {
    pub fn new(frame_type: FrameType, data: impl Into<Vec<u8>>, gap_us: u64) -> Self {
        Self {
            frame_type,
            data: data.into(),
            gap_us,
            vendor_gain: 0,
        }
    }
}

/// Reader that endlessly repeats a polling loop.
///
/// Its clock wraps at `counter_modulus`, and field markers in each batch are
/// handed over ahead of the other frames, the same way a real capture stack
/// front-loads them.
pub struct SimulatedReader {
    state: SourceState,
    pattern: Vec<PatternFrame>,
    frames_per_batch: usize,
    counter_modulus: u64,
    interval_ms: u64,
    max_batches: Option<u64>,
    clock: u64,
    position: usize,
    batches_emitted: u64,
    start_time: Option<Instant>,
}

impl Default for SimulatedReader {
    fn default() -> Self {
        Self::new(Self::default_pattern())
    }
}

impl SimulatedReader {
    pub fn new(pattern: Vec<PatternFrame>) -> Self {
        Self {
            state: SourceState::Unopened,
            pattern,
            frames_per_batch: 4,
            counter_modulus: u64::MAX,
            interval_ms: 0,
            max_batches: None,
            clock: 0,
            position: 0,
            batches_emitted: 0,
            start_time: None,
        }
    }

    /// A payment terminal style loop: idle pair, then A with ECP, B, F
    pub fn default_pattern() -> Vec<PatternFrame> {
        vec![
            PatternFrame::new(FrameType::On, vec![], 200_000),
            PatternFrame::new(FrameType::A, vec![0x52], 5_000),
            PatternFrame::new(FrameType::A, vec![0x6A, 0x01, 0x00, 0x00, 0x00], 1_000),
            PatternFrame::new(FrameType::B, vec![0x05, 0x00, 0x08], 5_000),
            PatternFrame::new(FrameType::F, vec![0x00, 0xFF, 0xFF, 0x01, 0x00], 5_000),
            PatternFrame::new(FrameType::Off, vec![], 5_000),
        ]
    }

    pub fn with_frames_per_batch(mut self, frames_per_batch: usize) -> Self {
        self.frames_per_batch = frames_per_batch.max(1);
        self
    }

    /// Start the clock at `start_us` and wrap it at `modulus`
    pub fn with_clock(mut self, start_us: u64, modulus: u64) -> Self {
        self.counter_modulus = modulus.max(1);
        self.clock = start_us % self.counter_modulus;
        self
    }

    pub fn with_max_batches(mut self, max_batches: u64) -> Self {
        self.max_batches = Some(max_batches);
        self
    }

    pub fn batches_emitted(&self) -> u64 {
        self.batches_emitted
    }

    fn next_frame(&mut self) -> RawFrame {
        let step = &self.pattern[self.position];
        self.clock =
            ((self.clock as u128 + step.gap_us as u128) % self.counter_modulus as u128) as u64;
        self.position = (self.position + 1) % self.pattern.len();
        RawFrame::new(step.frame_type, step.data.clone(), self.clock).with_gain(step.vendor_gain)
    }

    /// Builds one batch in delivery order, markers first
    pub fn build_batch(&mut self, arrival_monotonic_nanos: u64) -> FrameBatch {
        let frames: Vec<RawFrame> = (0..self.frames_per_batch).map(|_| self.next_frame()).collect();
        let (mut delivered, rest): (Vec<RawFrame>, Vec<RawFrame>) =
            frames.into_iter().partition(|f| f.frame_type.is_field_marker());
        delivered.extend(rest);
        FrameBatch::new(delivered, arrival_monotonic_nanos)
    }
}

#[async_trait]
impl FrameSource for SimulatedReader {
    async fn configure(&mut self, config: Value) -> Result<()> {
        if self.state != SourceState::Unopened {
            return Err(anyhow!("Cannot configure source in state {:?}", self.state));
        }

        if let Some(pattern) = config.get("pattern") {
            self.pattern = serde_json::from_value(pattern.clone())
                .map_err(|e| anyhow!("Invalid pattern: {}", e))?;
        }
        if let Some(n) = config["frames_per_batch"].as_u64() {
            self.frames_per_batch = (n as usize).max(1);
        }
        if let Some(modulus) = config["counter_modulus"].as_u64() {
            self.counter_modulus = modulus.max(1);
        }
        if let Some(start) = config["start_timestamp"].as_u64() {
            self.clock = start % self.counter_modulus;
        }
        if let Some(interval_ms) = config["interval_ms"].as_u64() {
            self.interval_ms = interval_ms;
        }
        if let Some(max_batches) = config["max_batches"].as_u64() {
            self.max_batches = Some(max_batches);
        }
        Ok(())
    }

    async fn start(&mut self) -> Result<()> {
        if self.state != SourceState::Unopened && self.state != SourceState::Stopped {
            return Err(anyhow!("Cannot start source in state {:?}", self.state));
        }
        if self.pattern.is_empty() {
            self.state = SourceState::Error("empty pattern".to_string());
            return Err(anyhow!("Simulated reader has an empty pattern"));
        }
        self.state = SourceState::Running;
        self.start_time = Some(Instant::now());
        Ok(())
    }

    async fn next_batch(&mut self) -> Result<Option<FrameBatch>> {
        match self.state {
            SourceState::Running => {}
            SourceState::Exhausted => return Ok(None),
            _ => return Err(anyhow!("Source not running")),
        }
        if self.max_batches.is_some_and(|max| self.batches_emitted >= max) {
            self.state = SourceState::Exhausted;
            return Ok(None);
        }
        if self.interval_ms > 0 {
            sleep(Duration::from_millis(self.interval_ms)).await;
        }

        let arrival = self
            .start_time
            .map(|t| t.elapsed().as_nanos() as u64)
            .unwrap_or(0);
        self.batches_emitted += 1;
        Ok(Some(self.build_batch(arrival)))
    }

    async fn stop(&mut self) -> Result<()> {
        if self.state == SourceState::Running {
            self.state = SourceState::Stopped;
        }
        Ok(())
    }

    fn state(&self) -> SourceState {
        self.state.clone()
    }
}
