//! Spaced-repetition interval and ease-factor updates.
//!
//! A deliberately small recurrence in the SM-2 family: correct answers grow
//! the interval by the (confidence-nudged) ease factor, incorrect answers
//! reset it to one day and dent the ease factor. All functions are pure.

use serde::{Deserialize, Serialize};

use crate::model::Confidence;

/// Lower bound for the ease factor.
pub const EASE_MIN: f64 = 1.3;

/// Upper bound for the ease factor.
pub const EASE_MAX: f64 = 2.5;

/// Starting ease factor for items with no review history.
pub const DEFAULT_EASE_FACTOR: f64 = 2.5;

/// Ease reduction applied on an incorrect answer.
pub const EASE_FAIL_PENALTY: f64 = 0.2;

/// Ease shift per confidence level away from neutral (3).
pub const EASE_CONFIDENCE_STEP: f64 = 0.05;

/// Shortest allowed interval.
pub const MIN_INTERVAL_DAYS: f64 = 1.0;

/// Per-item spaced-repetition state: the growth multiplier and the interval
/// it last produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SrsState {
    pub ease_factor: f64,
    pub interval_days: f64,
}

impl SrsState {
    #[must_use]
    pub fn new(ease_factor: f64, interval_days: f64) -> Self {
        Self {
            ease_factor,
            interval_days,
        }
    }

    /// State for an item that has never been reviewed.
    #[must_use]
    pub fn fresh() -> Self {
        Self {
            ease_factor: DEFAULT_EASE_FACTOR,
            interval_days: 0.0,
        }
    }
}

/// Apply one review to the state.
///
/// Correct: the ease factor shifts by `0.05 × (confidence − 3)` (clamped to
/// `[1.3, 2.5]`) and the next interval is the previous one (at least one
/// day) times the new ease factor. Incorrect: the interval resets to one day
/// regardless of history and the ease factor drops by the fail penalty,
/// floored at the minimum.
#[must_use]
pub fn review(state: &SrsState, correct: bool, confidence: Option<Confidence>) -> SrsState {
    if !correct {
        return SrsState {
            ease_factor: (state.ease_factor - EASE_FAIL_PENALTY).max(EASE_MIN),
            interval_days: MIN_INTERVAL_DAYS,
        };
    }

    let shift = confidence
        .map(|c| f64::from(c.offset_from_neutral()) * EASE_CONFIDENCE_STEP)
        .unwrap_or(0.0);
    let ease_factor = (state.ease_factor + shift).clamp(EASE_MIN, EASE_MAX);
    let interval_days =
        (state.interval_days.max(MIN_INTERVAL_DAYS) * ease_factor).max(MIN_INTERVAL_DAYS);

    SrsState {
        ease_factor,
        interval_days,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
