use serde::{Deserialize, Serialize};

use super::classifier;

/// Delta value meaning "no preceding event to measure against"
pub const CONTINUOUS: i64 = -1;

/// Polling frame technology as reported by the capture layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameType {
    A,
    B,
    F,
    On,
    Off,
    /// Anything the platform could not attribute, with its raw type code
    Unknown(u8),
}

impl FrameType {
    /// One-letter name used in compact loop signatures
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::B => "B",
            Self::F => "F",
            Self::On => "O",
            Self::Off => "X",
            Self::Unknown(_) => "U",
        }
    }

    pub fn is_field_marker(&self) -> bool {
        matches!(self, Self::On | Self::Off)
    }
}

/// A single frame exactly as delivered by the capture layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawFrame {
    #[serde(rename = "type")]
    pub frame_type: FrameType,

    #[serde(default)]
    pub data: Vec<u8>,

    /// Device-specific, unitless
    #[serde(default)]
    pub vendor_gain: u8,

    /// Reader clock in microseconds, subject to rollover
    pub timestamp: u64,
}

impl RawFrame {
    pub fn new(frame_type: FrameType, data: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self {
            frame_type,
            data: data.into(),
            vendor_gain: 0,
            timestamp,
        }
    }

    pub fn with_gain(mut self, vendor_gain: u8) -> Self {
        self.vendor_gain = vendor_gain;
        self
    }
}

/// Frames handed over together by one capture callback
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FrameBatch {
    pub frames: Vec<RawFrame>,
    pub arrival_monotonic_nanos: u64,
}

impl FrameBatch {
    pub fn new(frames: Vec<RawFrame>, arrival_monotonic_nanos: u64) -> Self {
        Self {
            frames,
            arrival_monotonic_nanos,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Convert into history entries; deltas stay unknown until normalization
    pub fn into_events(self) -> Vec<LoopEvent> {
        let at = self.arrival_monotonic_nanos;
        self.frames
            .into_iter()
            .map(|frame| LoopEvent::from_frame(frame, at))
            .collect()
    }
}

/// History entry: a raw frame plus its corrected delta
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopEvent {
    #[serde(rename = "type")]
    pub frame_type: FrameType,
    pub data: Vec<u8>,
    pub vendor_gain: u8,
    pub timestamp: u64,

    /// Microseconds since the previous event, or [`CONTINUOUS`]
    pub delta: i64,

    /// Monotonic arrival time of the batch that carried this frame
    pub at: u64,
}

impl LoopEvent {
    pub fn new(frame_type: FrameType, data: impl Into<Vec<u8>>, timestamp: u64) -> Self {
        Self {
            frame_type,
            data: data.into(),
            vendor_gain: 0,
            timestamp,
            delta: CONTINUOUS,
            at: 0,
        }
    }

    pub fn from_frame(frame: RawFrame, at: u64) -> Self {
        Self {
            frame_type: frame.frame_type,
            data: frame.data,
            vendor_gain: frame.vendor_gain,
            timestamp: frame.timestamp,
            delta: CONTINUOUS,
            at,
        }
    }

    pub fn with_delta(mut self, delta: i64) -> Self {
        self.delta = delta;
        self
    }

    /// Semantic command label, recomputed on every call
    pub fn name(&self) -> String {
        classifier::classify(self.frame_type, &self.data)
    }

    /// Equality used for cycle detection: type and payload only
    pub fn same_frame(a: &LoopEvent, b: &LoopEvent) -> bool {
        a.frame_type == b.frame_type && a.data == b.data
    }
}

/// One field activation between an ON and the closing OFF
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loop {
    /// Idle time before the ON marker
    pub start_delta: i64,

    /// Delta carried by the closing OFF, [`CONTINUOUS`] while the loop is open
    pub end_delta: i64,

    /// Frames between the markers; never contains ON or OFF
    pub events: Vec<LoopEvent>,

    pub observed_at: u64,
}

impl Loop {
    pub fn is_open(&self) -> bool {
        self.end_delta == CONTINUOUS
    }

    pub fn names(&self) -> Vec<String> {
        self.events.iter().map(LoopEvent::name).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_frame_ignores_timing() {
        let a = LoopEvent::new(FrameType::A, vec![0x52], 100).with_delta(10);
        let b = LoopEvent::new(FrameType::A, vec![0x52], 9_000).with_delta(400);
        assert!(LoopEvent::same_frame(&a, &b));

        let c = LoopEvent::new(FrameType::B, vec![0x52], 100);
        assert!(!LoopEvent::same_frame(&a, &c));
    }

    #[test]
    fn test_batch_into_events_marks_arrival() {
        let batch = FrameBatch::new(
            vec![RawFrame::new(FrameType::On, vec![], 5).with_gain(3)],
            777,
        );
        let events = batch.into_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].at, 777);
        assert_eq!(events[0].vendor_gain, 3);
        assert_eq!(events[0].delta, CONTINUOUS);
    }

    #[test]
    fn test_raw_frame_json() {
        let json = r#"{"type":"B","data":[5,0,8],"vendor_gain":2,"timestamp":42}"#;
        let frame: RawFrame = serde_json::from_str(json).unwrap();
        assert_eq!(frame.frame_type, FrameType::B);
        assert_eq!(frame.data, vec![0x05, 0x00, 0x08]);
        assert_eq!(frame.timestamp, 42);
    }
}
