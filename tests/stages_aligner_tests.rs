use pollscope::core::{FrameType, LoopEvent};
use pollscope::stages::aligner::{align, best_rotation};

fn ev(frame_type: FrameType, data: &[u8]) -> LoopEvent {
    LoopEvent::new(frame_type, data.to_vec(), 0)
}

fn types(events: &[LoopEvent]) -> Vec<FrameType> {
    events.iter().map(|e| e.frame_type).collect()
}

fn full_loop() -> Vec<LoopEvent> {
    vec![
        ev(FrameType::B, &[0x05, 0x00, 0x08]),
        ev(FrameType::F, &[0x00, 0xFF, 0xFF, 0x01, 0x00]),
        ev(FrameType::Off, &[]),
        ev(FrameType::On, &[]),
        ev(FrameType::A, &[0x52]),
    ]
}

#[test]
fn test_trivial_input_unchanged() {
    assert!(align(&[]).is_empty());
    let single = vec![ev(FrameType::F, &[0x00])];
    assert_eq!(align(&single), single);
}

#[test]
fn test_rotates_to_field_on() {
    let aligned = align(&full_loop());
    assert_eq!(
        types(&aligned),
        vec![FrameType::On, FrameType::A, FrameType::B, FrameType::F, FrameType::Off]
    );
}

#[test]
fn test_realigning_is_idempotent() {
    let aligned = align(&full_loop());
    assert_eq!(best_rotation(&aligned), 0);
    assert_eq!(align(&aligned), aligned);
}

#[test]
fn test_continuous_loop_prefers_technology_order() {
    let cycle = vec![
        ev(FrameType::F, &[0x00, 0xFF, 0xFF, 0x01, 0x00]),
        ev(FrameType::A, &[0x52]),
        ev(FrameType::B, &[0x05, 0x00, 0x00]),
    ];
    assert_eq!(
        types(&align(&cycle)),
        vec![FrameType::A, FrameType::B, FrameType::F]
    );
}

#[test]
fn test_idle_pair_sits_at_the_end() {
    // Two activations per cycle; the one followed by a bare ON/OFF pair wins
    let cycle = vec![
        ev(FrameType::On, &[]),
        ev(FrameType::Off, &[]),
        ev(FrameType::On, &[]),
        ev(FrameType::A, &[0x52]),
        ev(FrameType::B, &[0x05, 0x00, 0x00]),
        ev(FrameType::Off, &[]),
    ];
    let aligned = align(&cycle);
    assert_eq!(
        types(&aligned),
        vec![
            FrameType::On,
            FrameType::A,
            FrameType::B,
            FrameType::Off,
            FrameType::On,
            FrameType::Off,
        ]
    );
}

#[test]
fn test_tie_break_by_payload_length() {
    // Same technology twice: the longer head payload wins
    let cycle = vec![ev(FrameType::A, &[0x52]), ev(FrameType::A, &[0x6A, 0x01, 0x00, 0x00, 0x00])];
    let aligned = align(&cycle);
    assert_eq!(aligned[0].data, vec![0x6A, 0x01, 0x00, 0x00, 0x00]);
}
