use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;

/// Counters for one pipeline stage, shared across threads
pub struct StageMetrics {
    stage: String,
    batches_processed: AtomicU64,
    events_seen: AtomicU64,
    empty_results: AtomicU64,
    total_latency_us: AtomicU64,
    latency_samples: AtomicU64,
}

impl StageMetrics {
    pub fn new(stage: impl Into<String>) -> Self {
        Self {
            stage: stage.into(),
            batches_processed: AtomicU64::new(0),
            events_seen: AtomicU64::new(0),
            empty_results: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            latency_samples: AtomicU64::new(0),
        }
    }

    pub fn stage(&self) -> &str {
        &self.stage
    }

    pub fn batches_processed(&self) -> u64 {
        self.batches_processed.load(Ordering::Relaxed)
    }

    pub fn events_seen(&self) -> u64 {
        self.events_seen.load(Ordering::Relaxed)
    }

    /// Runs that produced nothing, e.g. no cycle found yet
    pub fn empty_results(&self) -> u64 {
        self.empty_results.load(Ordering::Relaxed)
    }

    pub fn record_batch(&self, events: usize) {
        self.batches_processed.fetch_add(1, Ordering::Relaxed);
        self.events_seen.fetch_add(events as u64, Ordering::Relaxed);
    }

    pub fn record_empty(&self) {
        self.empty_results.fetch_add(1, Ordering::Relaxed);
    }

    pub fn start_processing(&self) -> Instant {
        Instant::now()
    }

    pub fn finish_processing(&self, start: Instant) {
        let latency_us = start.elapsed().as_micros() as u64;
        self.total_latency_us.fetch_add(latency_us, Ordering::Relaxed);
        self.latency_samples.fetch_add(1, Ordering::Relaxed);
    }

    pub fn avg_latency_us(&self) -> u64 {
        let samples = self.latency_samples.load(Ordering::Relaxed);
        if samples == 0 {
            return 0;
        }
        self.total_latency_us.load(Ordering::Relaxed) / samples
    }
}
