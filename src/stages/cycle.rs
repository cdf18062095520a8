//! Detection of the repeating unit inside a window of polling events.
//!
//! The containment test is a single greedy pass: the cursor into the doubled
//! pattern advances on a match and drops back to zero on a mismatch, without
//! re-testing the mismatching element. Some valid repeats are missed when
//! foreign frames are interleaved in unlucky places; the next batch usually
//! settles it.

use crate::core::LoopEvent;

/// Number of trailing history entries examined per batch
pub const DEFAULT_SAMPLE_THRESHOLD: usize = 64;

/// Equality predicate used by every comparison in this module
pub type FrameEq<T> = fn(&T, &T) -> bool;

/// Minimal repeating period of `sample` under [`LoopEvent::same_frame`].
///
/// Empty when no repeat exists yet.
pub fn detect_cycle(sample: &[LoopEvent]) -> Vec<LoopEvent> {
    largest_repeating_sequence(sample, LoopEvent::same_frame).to_vec()
}

/// Longest `P` whose doubling `P ++ P` is contained in `items`, reduced to its
/// minimal repeating unit.
///
/// Candidates start in the first half of `items`. The first longest candidate
/// in scan order wins, which means the earliest start index.
pub fn largest_repeating_sequence<T>(items: &[T], eq: FrameEq<T>) -> &[T] {
    let n = items.len();
    let mut best: &[T] = &[];

    for start in 0..n / 2 {
        // P ++ P must fit, and P never reaches the last element
        let max_end = (start + n / 2).min(n - 1);
        for end in (start + best.len() + 1)..=max_end {
            let pattern = &items[start..end];
            if contains_doubled(items, pattern, eq) {
                best = pattern;
            }
        }
    }

    let unit = smallest_repeating_sequence(best, eq);
    if unit.is_empty() {
        best
    } else {
        unit
    }
}

/// Shortest prefix that reproduces `items` when repeated, or empty if none
/// shorter than half of `items` does.
pub fn smallest_repeating_sequence<T>(items: &[T], eq: FrameEq<T>) -> &[T] {
    let n = items.len();
    for length in 1..=n / 2 {
        if n % length != 0 {
            continue;
        }
        let prefix = &items[..length];
        let repeats = items
            .chunks(length)
            .all(|chunk| chunk.iter().zip(prefix).all(|(a, b)| eq(a, b)));
        if repeats {
            return prefix;
        }
    }
    &[]
}

/// Greedy scan for `pattern ++ pattern` inside `items`
fn contains_doubled<T>(items: &[T], pattern: &[T], eq: FrameEq<T>) -> bool {
    if pattern.is_empty() {
        return true;
    }
    let target = pattern.len() * 2;
    let mut cursor = 0;
    for item in items {
        if eq(item, &pattern[cursor % pattern.len()]) {
            cursor += 1;
            if cursor == target {
                return true;
            }
        } else {
            cursor = 0;
        }
    }
    false
}
