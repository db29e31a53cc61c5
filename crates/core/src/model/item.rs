use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::content::ReviewableContent;
use crate::scoring::AnswerScore;
use crate::srs::SrsState;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ConfidenceError {
    #[error("confidence must be between 1 and 5, got {0}")]
    OutOfRange(u8),
}

//
// ─── CONFIDENCE ────────────────────────────────────────────────────────────────
//

/// Self-reported recall confidence, an ordinal from 1 (guessed) to 5 (knew
/// it cold). Feeds the confidence bonus and the SRS ease adjustment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Confidence(u8);

impl Confidence {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    /// Converts a numeric level (1-5) to a `Confidence`.
    ///
    /// # Errors
    ///
    /// Returns `ConfidenceError::OutOfRange` if the value is not in 1-5.
    pub fn from_u8(value: u8) -> Result<Self, ConfidenceError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ConfidenceError::OutOfRange(value))
        }
    }

    /// Returns the underlying 1-5 level.
    #[must_use]
    pub fn level(&self) -> u8 {
        self.0
    }

    /// Signed distance from the neutral level (3): -2 ..= 2.
    #[must_use]
    pub fn offset_from_neutral(&self) -> i8 {
        #[allow(clippy::cast_possible_wrap)]
        let level = self.0 as i8;
        level - 3
    }
}

//
// ─── SESSION ITEM ──────────────────────────────────────────────────────────────
//

/// One reviewable content unit plus its mutable in-session review state.
///
/// `presented_at` is set at most once, on the item's first display, and is
/// the anchor for response-time measurement. Score and SRS fields stay at
/// their defaults until the item is answered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionItem {
    content: ReviewableContent,
    presented_at: Option<DateTime<Utc>>,
    user_answer: Option<String>,
    correct: Option<bool>,
    confidence: Option<Confidence>,
    attempts: u32,
    response_time_ms: u64,
    hints_used: u32,
    skipped: bool,
    base_score: f64,
    final_score: f64,
    ease_factor: f64,
    previous_interval_days: f64,
    next_interval_days: f64,
}

impl SessionItem {
    /// Wrap provider content in fresh review state.
    #[must_use]
    pub fn new(content: ReviewableContent) -> Self {
        Self {
            content,
            presented_at: None,
            user_answer: None,
            correct: None,
            confidence: None,
            attempts: 0,
            response_time_ms: 0,
            hints_used: 0,
            skipped: false,
            base_score: 0.0,
            final_score: 0.0,
            ease_factor: crate::srs::DEFAULT_EASE_FACTOR,
            previous_interval_days: 0.0,
            next_interval_days: 0.0,
        }
    }

    /// Seed the item with SRS state carried over from earlier reviews.
    #[must_use]
    pub fn with_srs_state(mut self, ease_factor: f64, previous_interval_days: f64) -> Self {
        self.ease_factor = ease_factor;
        self.previous_interval_days = previous_interval_days;
        self
    }

    /// Rehydrate an item from persisted storage.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn from_persisted(
        content: ReviewableContent,
        presented_at: Option<DateTime<Utc>>,
        user_answer: Option<String>,
        correct: Option<bool>,
        confidence: Option<Confidence>,
        attempts: u32,
        response_time_ms: u64,
        hints_used: u32,
        skipped: bool,
        base_score: f64,
        final_score: f64,
        ease_factor: f64,
        previous_interval_days: f64,
        next_interval_days: f64,
    ) -> Self {
        Self {
            content,
            presented_at,
            user_answer,
            correct,
            confidence,
            attempts,
            response_time_ms,
            hints_used,
            skipped,
            base_score,
            final_score,
            ease_factor,
            previous_interval_days,
            next_interval_days,
        }
    }

    #[must_use]
    pub fn content(&self) -> &ReviewableContent {
        &self.content
    }

    #[must_use]
    pub fn presented_at(&self) -> Option<DateTime<Utc>> {
        self.presented_at
    }

    /// Stamp the first presentation time. Returns true only on the first
    /// call; later calls leave the original timestamp untouched.
    pub fn mark_presented(&mut self, now: DateTime<Utc>) -> bool {
        if self.presented_at.is_some() {
            return false;
        }
        self.presented_at = Some(now);
        true
    }

    #[must_use]
    pub fn user_answer(&self) -> Option<&str> {
        self.user_answer.as_deref()
    }

    #[must_use]
    pub fn correct(&self) -> Option<bool> {
        self.correct
    }

    #[must_use]
    pub fn confidence(&self) -> Option<Confidence> {
        self.confidence
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn response_time_ms(&self) -> u64 {
        self.response_time_ms
    }

    #[must_use]
    pub fn hints_used(&self) -> u32 {
        self.hints_used
    }

    #[must_use]
    pub fn is_skipped(&self) -> bool {
        self.skipped
    }

    #[must_use]
    pub fn is_answered(&self) -> bool {
        self.correct.is_some()
    }

    #[must_use]
    pub fn base_score(&self) -> f64 {
        self.base_score
    }

    #[must_use]
    pub fn final_score(&self) -> f64 {
        self.final_score
    }

    #[must_use]
    pub fn ease_factor(&self) -> f64 {
        self.ease_factor
    }

    #[must_use]
    pub fn previous_interval_days(&self) -> f64 {
        self.previous_interval_days
    }

    #[must_use]
    pub fn next_interval_days(&self) -> f64 {
        self.next_interval_days
    }

    /// Record one hint consumption and return the new hint level.
    pub fn record_hint(&mut self) -> u32 {
        self.hints_used += 1;
        self.hints_used
    }

    /// Record a submitted answer.
    pub fn apply_answer(
        &mut self,
        user_answer: impl Into<String>,
        correct: bool,
        confidence: Option<Confidence>,
        response_time_ms: u64,
    ) {
        self.user_answer = Some(user_answer.into());
        self.correct = Some(correct);
        self.confidence = confidence;
        self.response_time_ms = response_time_ms;
        self.attempts += 1;
    }

    /// Store the computed base/final score for this item.
    pub fn apply_score(&mut self, score: AnswerScore) {
        self.base_score = score.base;
        self.final_score = score.final_score;
    }

    /// Store the post-review SRS state.
    pub fn apply_srs(&mut self, next: SrsState) {
        self.ease_factor = next.ease_factor;
        self.next_interval_days = next.interval_days;
    }

    pub fn mark_skipped(&mut self) {
        self.skipped = true;
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::content::ContentKind;
    use crate::model::ids::ItemId;
    use crate::time::fixed_now;

    fn build_item() -> SessionItem {
        let content = ReviewableContent::new(
            ItemId::new("kanji-7"),
            ContentKind::new("kanji").unwrap(),
            "tree",
            "ki",
            0.2,
        )
        .unwrap();
        SessionItem::new(content)
    }

    #[test]
    fn confidence_rejects_out_of_range_levels() {
        assert!(Confidence::from_u8(1).is_ok());
        assert!(Confidence::from_u8(5).is_ok());
        for bad in [0, 6, 250] {
            let err = Confidence::from_u8(bad).unwrap_err();
            assert!(matches!(err, ConfidenceError::OutOfRange(v) if v == bad));
        }
    }

    #[test]
    fn confidence_offset_is_centered_on_three() {
        assert_eq!(Confidence::from_u8(1).unwrap().offset_from_neutral(), -2);
        assert_eq!(Confidence::from_u8(3).unwrap().offset_from_neutral(), 0);
        assert_eq!(Confidence::from_u8(5).unwrap().offset_from_neutral(), 2);
    }

    #[test]
    fn presented_at_is_write_once() {
        let mut item = build_item();
        let first = fixed_now();
        let later = first + chrono::Duration::seconds(30);

        assert!(item.mark_presented(first));
        assert!(!item.mark_presented(later));
        assert_eq!(item.presented_at(), Some(first));
    }

    #[test]
    fn apply_answer_counts_attempts() {
        let mut item = build_item();
        item.apply_answer("ki", true, Confidence::from_u8(4).ok(), 1_500);
        item.apply_answer("ki", true, None, 900);

        assert_eq!(item.attempts(), 2);
        assert_eq!(item.user_answer(), Some("ki"));
        assert_eq!(item.correct(), Some(true));
        assert_eq!(item.response_time_ms(), 900);
    }

    #[test]
    fn hint_level_increments() {
        let mut item = build_item();
        assert_eq!(item.record_hint(), 1);
        assert_eq!(item.record_hint(), 2);
        assert_eq!(item.hints_used(), 2);
    }

    #[test]
    fn srs_seed_carries_over() {
        let item = build_item().with_srs_state(1.8, 6.0);
        assert_eq!(item.ease_factor(), 1.8);
        assert_eq!(item.previous_interval_days(), 6.0);
        assert_eq!(item.next_interval_days(), 0.0);
    }
}
