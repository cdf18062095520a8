use crate::core::{FrameType, Loop, LoopEvent, CONTINUOUS};

/// Split an aligned cycle into field activations.
///
/// An OFF closes the current loop with its delta as `end_delta`. An ON at the
/// start of a segment supplies `start_delta`. An ON met mid-segment starts a
/// new activation, so the frames collected so far are emitted as an open loop.
/// Whatever remains after the walk becomes a final open loop. Open loops are
/// therefore not always last in the returned list.
pub fn segment(aligned: &[LoopEvent], observed_at: u64) -> Vec<Loop> {
    let mut loops = Vec::new();
    let mut start_delta = CONTINUOUS;
    let mut events: Vec<LoopEvent> = Vec::new();
    let mut position = 0usize;

    for event in aligned {
        match event.frame_type {
            FrameType::Off => {
                loops.push(Loop {
                    start_delta,
                    end_delta: event.delta,
                    events: std::mem::take(&mut events),
                    observed_at,
                });
                start_delta = CONTINUOUS;
                position = 0;
                continue;
            }
            FrameType::On if position == 0 => {
                start_delta = event.delta;
            }
            FrameType::On => {
                loops.push(Loop {
                    start_delta,
                    end_delta: CONTINUOUS,
                    events: std::mem::take(&mut events),
                    observed_at,
                });
                start_delta = event.delta;
                position = 0;
            }
            _ => events.push(event.clone()),
        }
        position += 1;
    }

    if !events.is_empty() || start_delta != CONTINUOUS {
        loops.push(Loop {
            start_delta,
            end_delta: CONTINUOUS,
            events,
            observed_at,
        });
    }

    loops
}
