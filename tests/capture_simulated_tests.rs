use pollscope::capture::{capture_channel, FrameSource, PatternFrame, SimulatedReader, SourceState};
use pollscope::core::{FrameType, RawFrame};
use serde_json::json;
use tokio_test::block_on;

#[test]
fn test_reader_lifecycle() {
    let mut reader = SimulatedReader::default().with_max_batches(2);
    assert_eq!(reader.state(), SourceState::Unopened);

    block_on(async {
        assert!(reader.next_batch().await.is_err());

        reader.start().await.unwrap();
        assert_eq!(reader.state(), SourceState::Running);

        assert!(reader.next_batch().await.unwrap().is_some());
        assert!(reader.next_batch().await.unwrap().is_some());
        assert!(reader.next_batch().await.unwrap().is_none());
        assert_eq!(reader.state(), SourceState::Exhausted);
        assert!(reader.next_batch().await.unwrap().is_none());
    });
    assert_eq!(reader.batches_emitted(), 2);
}

#[test]
fn test_stop_and_restart() {
    let mut reader = SimulatedReader::default();
    block_on(async {
        reader.start().await.unwrap();
        assert!(reader.start().await.is_err());
        reader.stop().await.unwrap();
        assert_eq!(reader.state(), SourceState::Stopped);
        assert!(reader.next_batch().await.is_err());
        reader.start().await.unwrap();
    });
}

#[test]
fn test_configure_pattern_from_json() {
    let mut reader = SimulatedReader::default();
    block_on(async {
        reader
            .configure(json!({
                "pattern": [
                    {"type": "On", "gap_us": 100},
                    {"type": "A", "data": [82], "gap_us": 10, "vendor_gain": 7},
                ],
                "frames_per_batch": 2,
                "start_timestamp": 1000,
            }))
            .await
            .unwrap();
        reader.start().await.unwrap();

        let batch = reader.next_batch().await.unwrap().unwrap();
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.frames[0], RawFrame::new(FrameType::On, vec![], 1_100));
        assert_eq!(
            batch.frames[1],
            RawFrame::new(FrameType::A, vec![0x52], 1_110).with_gain(7)
        );
    });
}

#[test]
fn test_configure_rejected_after_start() {
    let mut reader = SimulatedReader::default();
    block_on(async {
        assert!(reader.configure(json!({"pattern": "nonsense"})).await.is_err());
        reader.start().await.unwrap();
        assert!(reader.configure(json!({"frames_per_batch": 2})).await.is_err());
    });
}

#[test]
fn test_empty_pattern_fails_to_start() {
    let mut reader = SimulatedReader::new(vec![]);
    block_on(async {
        assert!(reader.start().await.is_err());
    });
    assert!(matches!(reader.state(), SourceState::Error(_)));
}

#[test]
fn test_batches_continue_the_pattern() {
    let pattern = vec![
        PatternFrame::new(FrameType::A, vec![0x52], 10),
        PatternFrame::new(FrameType::B, vec![0x05, 0x00, 0x00], 10),
        PatternFrame::new(FrameType::F, vec![0x00, 0xFF, 0xFF, 0x01, 0x00], 10),
    ];
    let mut reader = SimulatedReader::new(pattern).with_frames_per_batch(2);

    let first = reader.build_batch(0);
    let second = reader.build_batch(1);
    let types: Vec<FrameType> = first
        .frames
        .iter()
        .chain(&second.frames)
        .map(|f| f.frame_type)
        .collect();
    assert_eq!(types, vec![FrameType::A, FrameType::B, FrameType::F, FrameType::A]);
    assert_eq!(second.frames[1].timestamp, 40);
    assert_eq!(second.arrival_monotonic_nanos, 1);
}

#[test]
fn test_capture_channel_drops_when_full() {
    let (sender, rx) = capture_channel(1);
    let frame = RawFrame::new(FrameType::A, vec![0x26], 5);

    assert!(sender.deliver(vec![frame.clone()], 1));
    assert!(!sender.deliver(vec![frame.clone()], 2));

    let batch = rx.try_recv().unwrap();
    assert_eq!(batch.arrival_monotonic_nanos, 1);

    drop(rx);
    assert!(!sender.deliver(vec![frame], 3));
}
