use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::content::DifficultyBucket;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum StatisticsError {
    #[error("completed ({completed}) plus skipped ({skipped}) exceeds total ({total})")]
    CountsExceedTotal {
        completed: u32,
        skipped: u32,
        total: u32,
    },

    #[error("correct ({correct}) plus incorrect ({incorrect}) does not match completed ({completed})")]
    CountMismatch {
        correct: u32,
        incorrect: u32,
        completed: u32,
    },
}

/// Correct/total tally for one difficulty band.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketTally {
    pub correct: u32,
    pub total: u32,
}

//
// ─── SESSION STATISTICS ────────────────────────────────────────────────────────
//

/// Incrementally maintained aggregate for the in-flight session.
///
/// Answered items land in `completed_items` (and exactly one of
/// correct/incorrect); skipped items are counted separately and never touch
/// the accuracy formula. Accuracy is recomputed from the counters after
/// every answer rather than adjusted in place, so it cannot drift.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionStatistics {
    total_items: u32,
    completed_items: u32,
    correct_items: u32,
    incorrect_items: u32,
    skipped_items: u32,
    accuracy: f64,
    current_streak: u32,
    best_streak: u32,
    easy: BucketTally,
    medium: BucketTally,
    hard: BucketTally,
    time_spent_ms: u64,
    duration_ms: Option<u64>,
}

impl SessionStatistics {
    /// Fresh statistics for a session of `total_items` items.
    #[must_use]
    pub fn new(total_items: u32) -> Self {
        Self {
            total_items,
            completed_items: 0,
            correct_items: 0,
            incorrect_items: 0,
            skipped_items: 0,
            accuracy: 0.0,
            current_streak: 0,
            best_streak: 0,
            easy: BucketTally::default(),
            medium: BucketTally::default(),
            hard: BucketTally::default(),
            time_spent_ms: 0,
            duration_ms: None,
        }
    }

    /// Rehydrate statistics from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `StatisticsError::CountsExceedTotal` or
    /// `StatisticsError::CountMismatch` if the counters do not align.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        total_items: u32,
        completed_items: u32,
        correct_items: u32,
        incorrect_items: u32,
        skipped_items: u32,
        current_streak: u32,
        best_streak: u32,
        easy: BucketTally,
        medium: BucketTally,
        hard: BucketTally,
        time_spent_ms: u64,
        duration_ms: Option<u64>,
    ) -> Result<Self, StatisticsError> {
        if completed_items + skipped_items > total_items {
            return Err(StatisticsError::CountsExceedTotal {
                completed: completed_items,
                skipped: skipped_items,
                total: total_items,
            });
        }
        if correct_items + incorrect_items != completed_items {
            return Err(StatisticsError::CountMismatch {
                correct: correct_items,
                incorrect: incorrect_items,
                completed: completed_items,
            });
        }

        let mut stats = Self {
            total_items,
            completed_items,
            correct_items,
            incorrect_items,
            skipped_items,
            accuracy: 0.0,
            current_streak,
            best_streak,
            easy,
            medium,
            hard,
            time_spent_ms,
            duration_ms,
        };
        stats.recompute_accuracy();
        Ok(stats)
    }

    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.total_items
    }

    #[must_use]
    pub fn completed_items(&self) -> u32 {
        self.completed_items
    }

    #[must_use]
    pub fn correct_items(&self) -> u32 {
        self.correct_items
    }

    #[must_use]
    pub fn incorrect_items(&self) -> u32 {
        self.incorrect_items
    }

    #[must_use]
    pub fn skipped_items(&self) -> u32 {
        self.skipped_items
    }

    /// Percentage of completed items answered correctly, in `[0, 100]`.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        self.accuracy
    }

    #[must_use]
    pub fn current_streak(&self) -> u32 {
        self.current_streak
    }

    #[must_use]
    pub fn best_streak(&self) -> u32 {
        self.best_streak
    }

    #[must_use]
    pub fn bucket(&self, bucket: DifficultyBucket) -> BucketTally {
        match bucket {
            DifficultyBucket::Easy => self.easy,
            DifficultyBucket::Medium => self.medium,
            DifficultyBucket::Hard => self.hard,
        }
    }

    /// Cumulative answer response time.
    #[must_use]
    pub fn time_spent_ms(&self) -> u64 {
        self.time_spent_ms
    }

    /// Wall-clock session duration, set at finalization.
    #[must_use]
    pub fn duration_ms(&self) -> Option<u64> {
        self.duration_ms
    }

    /// Record one answered item and return the new streak.
    pub fn record_answer(
        &mut self,
        correct: bool,
        bucket: DifficultyBucket,
        response_time_ms: u64,
    ) -> u32 {
        self.completed_items += 1;
        if correct {
            self.correct_items += 1;
            self.current_streak += 1;
            self.best_streak = self.best_streak.max(self.current_streak);
        } else {
            self.incorrect_items += 1;
            self.current_streak = 0;
        }

        let tally = match bucket {
            DifficultyBucket::Easy => &mut self.easy,
            DifficultyBucket::Medium => &mut self.medium,
            DifficultyBucket::Hard => &mut self.hard,
        };
        tally.total += 1;
        if correct {
            tally.correct += 1;
        }

        self.time_spent_ms += response_time_ms;
        self.recompute_accuracy();
        self.current_streak
    }

    /// Record one skipped item. Skips break the streak but stay out of the
    /// accuracy formula.
    pub fn record_skip(&mut self) {
        self.skipped_items += 1;
        self.current_streak = 0;
    }

    /// Seal the aggregate with the session's wall-clock duration.
    pub fn finalize(&mut self, duration_ms: u64) {
        self.duration_ms = Some(duration_ms);
        self.recompute_accuracy();
    }

    fn recompute_accuracy(&mut self) {
        self.accuracy = if self.completed_items == 0 {
            0.0
        } else {
            f64::from(self.correct_items) / f64::from(self.completed_items) * 100.0
        };
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accuracy_is_recomputed_from_counters() {
        let mut stats = SessionStatistics::new(4);
        stats.record_answer(true, DifficultyBucket::Easy, 1_000);
        assert_eq!(stats.accuracy(), 100.0);

        stats.record_answer(false, DifficultyBucket::Hard, 2_000);
        assert_eq!(stats.accuracy(), 50.0);

        stats.record_answer(true, DifficultyBucket::Medium, 500);
        let expected = 2.0 / 3.0 * 100.0;
        assert!((stats.accuracy() - expected).abs() < 1e-9);
    }

    #[test]
    fn skips_break_streak_but_not_accuracy() {
        let mut stats = SessionStatistics::new(3);
        stats.record_answer(true, DifficultyBucket::Easy, 100);
        stats.record_skip();

        assert_eq!(stats.current_streak(), 0);
        assert_eq!(stats.best_streak(), 1);
        assert_eq!(stats.skipped_items(), 1);
        assert_eq!(stats.completed_items(), 1);
        assert_eq!(stats.accuracy(), 100.0);
    }

    #[test]
    fn streak_tracks_best() {
        let mut stats = SessionStatistics::new(10);
        for _ in 0..3 {
            stats.record_answer(true, DifficultyBucket::Easy, 100);
        }
        stats.record_answer(false, DifficultyBucket::Easy, 100);
        stats.record_answer(true, DifficultyBucket::Easy, 100);

        assert_eq!(stats.current_streak(), 1);
        assert_eq!(stats.best_streak(), 3);
    }

    #[test]
    fn buckets_tally_independently() {
        let mut stats = SessionStatistics::new(3);
        stats.record_answer(true, DifficultyBucket::Easy, 100);
        stats.record_answer(false, DifficultyBucket::Hard, 100);
        stats.record_answer(true, DifficultyBucket::Hard, 100);

        assert_eq!(stats.bucket(DifficultyBucket::Easy).correct, 1);
        assert_eq!(stats.bucket(DifficultyBucket::Easy).total, 1);
        assert_eq!(stats.bucket(DifficultyBucket::Hard).correct, 1);
        assert_eq!(stats.bucket(DifficultyBucket::Hard).total, 2);
        assert_eq!(stats.bucket(DifficultyBucket::Medium).total, 0);
    }

    #[test]
    fn from_persisted_rejects_misaligned_counts() {
        let err = SessionStatistics::from_persisted(
            2,
            2,
            1,
            1,
            1,
            0,
            0,
            BucketTally::default(),
            BucketTally::default(),
            BucketTally::default(),
            0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, StatisticsError::CountsExceedTotal { .. }));

        let err = SessionStatistics::from_persisted(
            3,
            2,
            2,
            1,
            0,
            0,
            0,
            BucketTally::default(),
            BucketTally::default(),
            BucketTally::default(),
            0,
            None,
        )
        .unwrap_err();
        assert!(matches!(err, StatisticsError::CountMismatch { .. }));
    }

    #[test]
    fn finalize_records_duration() {
        let mut stats = SessionStatistics::new(1);
        stats.record_answer(true, DifficultyBucket::Easy, 800);
        stats.finalize(65_000);
        assert_eq!(stats.duration_ms(), Some(65_000));
        assert_eq!(stats.time_spent_ms(), 800);
    }
}
