//! Rotation of a detected cycle to a canonical starting phase.
//!
//! Rotations that open on ON right after an OFF are preferred. Each candidate
//! is scored by how well it walks the technologies in the A -> B -> F order
//! readers use, with two small deterministic bonuses to keep the choice
//! stable for continuous (marker-free) loops.

use crate::core::{FrameType, LoopEvent};

/// Points for every technology step up within a rotation
const RANK_STEP_SCORE: f64 = 2.0;
/// Bonus when the rotation ends with an idle ON, OFF pair
const TRAILING_IDLE_PAIR_SCORE: f64 = 1.0;
/// Tie-break weight on the first event's payload length
const LENGTH_WEIGHT: f64 = 0.001;
/// Tie-break weight on the first event's leading byte, read as signed
const FIRST_BYTE_WEIGHT: f64 = 0.00001;

/// Polling order rank; unranked frames never raise the score
fn technology_rank(frame_type: FrameType) -> i32 {
    match frame_type {
        FrameType::A => 2,
        FrameType::B => 3,
        FrameType::F => 4,
        _ => -1,
    }
}

/// Rotate `cycle` so it starts at its best-scoring phase
pub fn align(cycle: &[LoopEvent]) -> Vec<LoopEvent> {
    let offset = best_rotation(cycle);
    let mut rotated = cycle.to_vec();
    rotated.rotate_left(offset);
    rotated
}

/// Offset of the best-scoring rotation; zero for trivial input.
/// Exact ties keep the first candidate found.
pub fn best_rotation(cycle: &[LoopEvent]) -> usize {
    let n = cycle.len();
    if n <= 1 {
        return 0;
    }

    let mut candidates: Vec<usize> = (0..n)
        .filter(|&r| {
            cycle[r].frame_type == FrameType::On
                && cycle[(r + n - 1) % n].frame_type == FrameType::Off
        })
        .collect();
    if candidates.is_empty() {
        candidates = (0..n).collect();
    }

    let mut best: Option<(f64, usize)> = None;
    for rotation in candidates {
        let score = rotation_score(cycle, rotation);
        if best.map_or(true, |(top, _)| score > top) {
            best = Some((score, rotation));
        }
    }
    best.map(|(_, rotation)| rotation).unwrap_or(0)
}

/// Score of `cycle` read starting at `rotation`
pub fn rotation_score(cycle: &[LoopEvent], rotation: usize) -> f64 {
    let n = cycle.len();
    let at = |index: usize| &cycle[(index + rotation) % n];

    let head = at(0);
    let mut score = head.data.len() as f64 * LENGTH_WEIGHT;
    score += head.data.first().map_or(0, |&b| b as i8) as f64 * FIRST_BYTE_WEIGHT;

    let mut highest_rank = -1;
    for index in 0..n {
        let rank = technology_rank(at(index).frame_type);
        if rank > highest_rank {
            score += RANK_STEP_SCORE;
            highest_rank = rank;
        }
    }

    if n >= 2 && at(n - 2).frame_type == FrameType::On && at(n - 1).frame_type == FrameType::Off {
        score += TRAILING_IDLE_PAIR_SCORE;
    }

    score
}
