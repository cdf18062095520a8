//! Reorder and rollover correction for the tail of the event history.
//!
//! The capture layer hands some frame types over ahead of others, and the
//! reader clock wraps. Each batch is corrected against a small window of the
//! preceding history: entries that sit far behind the window's first
//! timestamp are taken to be post-rollover and moved after everything else.

use crate::core::LoopEvent;
use tracing::trace;

/// Minimum number of events re-sorted on every batch
pub const DEFAULT_SORT_THRESHOLD: usize = 16;

/// Backwards jump (µs) beyond which a timestamp is read as a rollover
pub const DEFAULT_WRAP_THRESHOLD_US: u64 = 3_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventNormalizer {
    sort_threshold: usize,
    wrap_threshold: u64,
}

impl Default for EventNormalizer {
    fn default() -> Self {
        Self::new(DEFAULT_SORT_THRESHOLD, DEFAULT_WRAP_THRESHOLD_US)
    }
}

impl EventNormalizer {
    pub fn new(sort_threshold: usize, wrap_threshold: u64) -> Self {
        Self {
            sort_threshold,
            wrap_threshold,
        }
    }

    pub fn sort_threshold(&self) -> usize {
        self.sort_threshold
    }

    pub fn wrap_threshold(&self) -> u64 {
        self.wrap_threshold
    }

    /// Append `batch` to `history` and correct the trailing window in place.
    ///
    /// Entries before the window are never touched. Returns the number of
    /// trailing entries that were rewritten (zero for an empty batch).
    pub fn normalize(&self, history: &mut Vec<LoopEvent>, batch: Vec<LoopEvent>) -> usize {
        if batch.is_empty() {
            return 0;
        }
        let window_len =
            (self.sort_threshold.max(batch.len()) + 1).min(history.len() + batch.len());
        history.reserve(batch.len());
        history.extend(batch);

        let start = history.len() - window_len;
        self.correct_window(&mut history[start..]);
        window_len
    }

    fn correct_window(&self, window: &mut [LoopEvent]) {
        if window.len() <= 1 {
            return;
        }
        let (first, rest) = window.split_at_mut(1);
        let anchor = first[0].timestamp;

        // Nothing can be flagged as wrapped while the anchor is still below the threshold
        let wrap_floor = anchor.checked_sub(self.wrap_threshold);
        let is_wrapped =
            |event: &LoopEvent| wrap_floor.is_some_and(|floor| event.timestamp < floor);

        // Stable sort on (group, timestamp) keeps delivery order among equal timestamps
        rest.sort_by_key(|event| (is_wrapped(event), event.timestamp));

        let mut previous = anchor;
        for event in rest.iter_mut() {
            event.delta = event.timestamp.saturating_sub(previous).min(i64::MAX as u64) as i64;
            previous = event.timestamp;
        }

        trace!(
            window = window.len(),
            wrapped = window[1..].iter().filter(|e| is_wrapped(e)).count(),
            "normalized history tail"
        );
    }
}
