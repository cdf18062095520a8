use pollscope::capture::SimulatedReader;
use pollscope::core::{FrameBatch, FrameType, RawFrame};
use pollscope::engine::{Display, DisplayMode, LoopPipeline, PipelineConfig};
use serde_json::json;

const ROLLOVER: u64 = 1 << 32;

fn feed(pipeline: &mut LoopPipeline, reader: &mut SimulatedReader, batches: u64) {
    for i in 0..batches {
        let batch = reader.build_batch(i * 1_000_000);
        pipeline.process_batch(batch);
    }
}

#[test]
fn test_pipeline_from_json() {
    let pipeline = LoopPipeline::from_json(json!({"sample_threshold": 48}));
    assert!(pipeline.is_ok());
    assert_eq!(pipeline.unwrap().config().sample_threshold, 48);

    assert!(LoopPipeline::from_json(json!({"sample_threshold": 1})).is_err());
}

#[test]
fn test_reconstructs_payment_terminal_loop() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let mut reader = SimulatedReader::default().with_frames_per_batch(4);
    feed(&mut pipeline, &mut reader, 30);

    let view = pipeline.view();
    assert!(view.is_settled());
    assert_eq!(view.cycle.len(), 6);
    assert_eq!(view.cycle[0].frame_type, FrameType::On);
    assert_eq!(view.cycle[5].frame_type, FrameType::Off);

    assert_eq!(view.loops.len(), 1);
    let activation = &view.loops[0];
    assert_eq!(activation.start_delta, 200_000);
    assert_eq!(activation.end_delta, 5_000);
    assert_eq!(
        activation.names(),
        vec!["WUPA", "ECP1_VAS_OR_PAYMENT", "WUPB", "WILDCARD"]
    );
    assert_eq!(view.observed_at, 29 * 1_000_000);
}

#[test]
fn test_history_is_chronological_despite_front_loading() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let mut reader = SimulatedReader::default()
        .with_frames_per_batch(4)
        .with_clock(1_000, u64::MAX);
    feed(&mut pipeline, &mut reader, 12);

    let history = pipeline.history();
    assert_eq!(history.len(), 48);
    assert!(history.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(history[1..].iter().all(|e| e.delta >= 0));
}

#[test]
fn test_survives_clock_rollover() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let mut reader = SimulatedReader::default()
        .with_frames_per_batch(4)
        .with_clock(ROLLOVER - 1_000_000, ROLLOVER);
    feed(&mut pipeline, &mut reader, 30);

    // The wrap point sits inside the history; order across it is preserved
    let history = pipeline.history();
    let wrap_at = history
        .windows(2)
        .position(|w| w[1].timestamp < w[0].timestamp)
        .map(|i| i + 1)
        .expect("clock should have wrapped");
    assert!(history[..wrap_at].windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert!(history[wrap_at..].windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(history[wrap_at].delta, 0);

    let view = pipeline.view();
    assert_eq!(view.loops.len(), 1);
    assert_eq!(view.loops[0].events.len(), 4);
}

#[test]
fn test_empty_batch_skips_downstream() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let mut reader = SimulatedReader::default();
    feed(&mut pipeline, &mut reader, 20);
    let before = pipeline.view().clone();
    let history_len = pipeline.history().len();

    assert!(pipeline.process_batch(FrameBatch::new(vec![], 5)).is_none());
    assert_eq!(pipeline.view(), &before);
    assert_eq!(pipeline.history().len(), history_len);
}

#[test]
fn test_unsettled_until_repeat() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let batch = FrameBatch::new(
        vec![
            RawFrame::new(FrameType::On, vec![], 10),
            RawFrame::new(FrameType::A, vec![0x52], 20),
        ],
        1,
    );
    let view = pipeline.process_batch(batch).expect("non-empty batch");
    assert!(!view.is_settled());
    assert!(view.loops.is_empty());
    assert_eq!(view.history_len, 2);
}

#[test]
fn test_history_limit_and_clear() {
    let config = PipelineConfig::from_json(json!({"history_limit": 100})).unwrap();
    let mut pipeline = LoopPipeline::new(config);
    let mut reader = SimulatedReader::default().with_frames_per_batch(8);
    feed(&mut pipeline, &mut reader, 20);

    assert_eq!(pipeline.history().len(), 100);
    assert!(pipeline.view().is_settled());

    pipeline.clear();
    assert!(pipeline.history().is_empty());
    assert!(pipeline.view().loops.is_empty());
    assert_eq!(pipeline.display(DisplayMode::History), Display::History(&[]));
}

#[test]
fn test_display_modes() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let mut reader = SimulatedReader::default();
    feed(&mut pipeline, &mut reader, 20);

    match pipeline.display(DisplayMode::History) {
        Display::History(events) => assert_eq!(events.len(), 80),
        other => panic!("unexpected display {:?}", other),
    }
    match pipeline.display(DisplayMode::Loop) {
        Display::Loops(loops) => assert_eq!(loops.len(), 1),
        other => panic!("unexpected display {:?}", other),
    }
}

#[test]
fn test_stage_metrics_recorded() {
    let mut pipeline = LoopPipeline::new(PipelineConfig::default());
    let mut reader = SimulatedReader::default();
    feed(&mut pipeline, &mut reader, 3);
    pipeline.process_batch(FrameBatch::default());

    let snapshot = pipeline.metrics().snapshot();
    assert_eq!(snapshot["normalize"].batches_processed, 3);
    assert_eq!(snapshot["normalize"].events_seen, 12);
    assert_eq!(snapshot["segment"].batches_processed, 3);
    // Only the third batch holds a full repeat of the 6-frame loop
    assert_eq!(snapshot["detect"].empty_results, 2);
}
