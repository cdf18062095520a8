use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{FrameBatch, RawFrame};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SourceState {
    Unopened,
    Running,
    Stopped,
    Exhausted,
    Error(String),
}

/// Handle given to the platform's capture callback.
///
/// Delivery never blocks the callback thread; when the consumer falls behind
/// the batch is dropped and reported.
#[derive(Clone)]
pub struct CaptureSender {
    tx: Sender<FrameBatch>,
}

impl CaptureSender {
    pub fn deliver(&self, frames: Vec<RawFrame>, arrival_monotonic_nanos: u64) -> bool {
        match self.tx.try_send(FrameBatch::new(frames, arrival_monotonic_nanos)) {
            Ok(()) => true,
            Err(TrySendError::Full(batch)) => {
                warn!(frames = batch.len(), "capture queue full, batch dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }
}

/// Bounded queue between the capture callback and the pipeline
pub fn capture_channel(capacity: usize) -> (CaptureSender, Receiver<FrameBatch>) {
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (CaptureSender { tx }, rx)
}
