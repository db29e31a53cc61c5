//! Pure per-answer score computation.
//!
//! Deterministic in its inputs: correctness, response time, confidence, and
//! hint count. The base score reflects correctness and speed only; hint
//! penalties and confidence bonuses apply to the final score.

use crate::model::Confidence;

/// Per-item score ceiling before bonuses.
pub const MAX_BASE_SCORE: f64 = 100.0;

/// Flat score for an incorrect answer. Attempting still earns something.
pub const INCORRECT_SCORE: f64 = 10.0;

/// Multiplier for correct answers under the fast-response threshold.
pub const SPEED_BONUS: f64 = 1.2;

/// Default fast-response threshold.
pub const DEFAULT_FAST_RESPONSE_MS: u64 = 3_000;

/// Final-score bonus per confidence level on correct answers (max +10%).
pub const CONFIDENCE_BONUS_STEP: f64 = 0.02;

/// Multiplicative final-score penalty per hint consumed.
pub const HINT_PENALTY_FACTOR: f64 = 0.9;

/// Outcome of scoring one answer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnswerScore {
    /// Correctness- and speed-derived score, before bonuses and penalties.
    pub base: f64,
    /// Base score after the confidence bonus and hint penalty.
    pub final_score: f64,
}

/// Score one answer.
///
/// The hint penalty compounds per hint and caps the confidence bonus: with a
/// maximum bonus of +10% and a 10% penalty per hint, any hinted answer ends
/// at or below its base score, and any hint-free correct answer at or above
/// it.
#[must_use]
pub fn score_answer(
    correct: bool,
    response_time_ms: u64,
    confidence: Option<Confidence>,
    hints_used: u32,
    fast_response_ms: u64,
) -> AnswerScore {
    let base = base_score(correct, response_time_ms, fast_response_ms);

    let mut final_score = base;
    if correct {
        final_score *= confidence_multiplier(confidence);
    }
    final_score *= hint_penalty(hints_used);

    AnswerScore {
        base,
        final_score: final_score.max(0.0),
    }
}

/// Correctness plus speed: incorrect answers earn the flat score; correct
/// answers earn the maximum, boosted when under the fast-response threshold.
#[must_use]
pub fn base_score(correct: bool, response_time_ms: u64, fast_response_ms: u64) -> f64 {
    if !correct {
        return INCORRECT_SCORE;
    }
    if response_time_ms < fast_response_ms {
        MAX_BASE_SCORE * SPEED_BONUS
    } else {
        MAX_BASE_SCORE
    }
}

/// `1 + 2%` per confidence level; `1.0` when no confidence was reported.
#[must_use]
pub fn confidence_multiplier(confidence: Option<Confidence>) -> f64 {
    match confidence {
        Some(c) => 1.0 + f64::from(c.level()) * CONFIDENCE_BONUS_STEP,
        None => 1.0,
    }
}

/// Compounding hint penalty: `0.9^hints`.
#[must_use]
pub fn hint_penalty(hints_used: u32) -> f64 {
    HINT_PENALTY_FACTOR.powi(i32::try_from(hints_used).unwrap_or(i32::MAX))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn confidence(level: u8) -> Option<Confidence> {
        Some(Confidence::from_u8(level).unwrap())
    }

    #[test]
    fn fast_confident_answer_exceeds_base_maximum() {
        let score = score_answer(true, 1_200, confidence(5), 0, DEFAULT_FAST_RESPONSE_MS);
        assert_eq!(score.base, 120.0);
        assert!(score.final_score > MAX_BASE_SCORE);
        assert!((score.final_score - 132.0).abs() < 1e-9);
    }

    #[test]
    fn slow_correct_answer_earns_the_plain_maximum() {
        let score = score_answer(true, 10_000, None, 0, DEFAULT_FAST_RESPONSE_MS);
        assert_eq!(score.base, MAX_BASE_SCORE);
        assert_eq!(score.final_score, MAX_BASE_SCORE);
    }

    #[test]
    fn incorrect_answers_earn_the_flat_score() {
        let fast = score_answer(false, 500, confidence(5), 0, DEFAULT_FAST_RESPONSE_MS);
        let slow = score_answer(false, 60_000, None, 0, DEFAULT_FAST_RESPONSE_MS);
        assert_eq!(fast.base, INCORRECT_SCORE);
        assert_eq!(slow.base, INCORRECT_SCORE);
        // No confidence bonus on incorrect answers.
        assert_eq!(fast.final_score, INCORRECT_SCORE);
    }

    #[test]
    fn hint_penalty_strictly_decreases_final_score() {
        let clean = score_answer(true, 5_000, confidence(4), 0, DEFAULT_FAST_RESPONSE_MS);
        let one_hint = score_answer(true, 5_000, confidence(4), 1, DEFAULT_FAST_RESPONSE_MS);
        let two_hints = score_answer(true, 5_000, confidence(4), 2, DEFAULT_FAST_RESPONSE_MS);

        assert!(one_hint.final_score < clean.final_score);
        assert!(two_hints.final_score < one_hint.final_score);
        assert_eq!(one_hint.base, clean.base);
    }

    #[test]
    fn hinted_answers_never_exceed_their_base() {
        // Even maximum confidence cannot outweigh a single hint.
        for hints in 1..6 {
            let score = score_answer(true, 100, confidence(5), hints, DEFAULT_FAST_RESPONSE_MS);
            assert!(
                score.final_score <= score.base,
                "hints={hints}: {} > {}",
                score.final_score,
                score.base
            );
        }
    }

    #[test]
    fn hint_free_confident_answers_never_fall_below_base() {
        for level in 1..=5 {
            let score = score_answer(true, 5_000, confidence(level), 0, DEFAULT_FAST_RESPONSE_MS);
            assert!(score.final_score >= score.base);
        }
    }

    #[test]
    fn penalty_floors_at_zero() {
        let score = score_answer(false, 1_000, None, 40, DEFAULT_FAST_RESPONSE_MS);
        assert!(score.final_score >= 0.0);
        assert!(score.final_score < 1.0);
    }
}
