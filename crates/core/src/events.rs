//! Typed events emitted by the session engine.
//!
//! Every state transition publishes exactly one event per observable fact,
//! in a fixed order, from fully-updated state. Payloads are serializable so
//! analytics adapters can forward them verbatim.

use serde::Serialize;
use std::fmt;

use crate::model::{Confidence, ContentKind, ItemId, ReviewMode, SessionId, SessionStatistics};

/// Discriminant used for event-bus subscriptions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    SessionStarted,
    ItemPresented,
    ItemAnswered,
    ItemSkipped,
    ItemHintUsed,
    ProgressUpdated,
    StreakUpdated,
    SessionPaused,
    SessionResumed,
    TimeoutWarning,
    SessionCompleted,
    SessionAbandoned,
    AchievementUnlocked,
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::SessionStarted => "SESSION_STARTED",
            Self::ItemPresented => "ITEM_PRESENTED",
            Self::ItemAnswered => "ITEM_ANSWERED",
            Self::ItemSkipped => "ITEM_SKIPPED",
            Self::ItemHintUsed => "ITEM_HINT_USED",
            Self::ProgressUpdated => "PROGRESS_UPDATED",
            Self::StreakUpdated => "STREAK_UPDATED",
            Self::SessionPaused => "SESSION_PAUSED",
            Self::SessionResumed => "SESSION_RESUMED",
            Self::TimeoutWarning => "TIMEOUT_WARNING",
            Self::SessionCompleted => "SESSION_COMPLETED",
            Self::SessionAbandoned => "SESSION_ABANDONED",
            Self::AchievementUnlocked => "ACHIEVEMENT_UNLOCKED",
        };
        write!(f, "{label}")
    }
}

//
// ─── PAYLOADS ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStarted {
    pub session_id: SessionId,
    pub item_count: usize,
    pub mode: ReviewMode,
    pub content_kinds: Vec<ContentKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemPresented {
    pub item_id: ItemId,
    pub kind: ContentKind,
    pub index: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemAnswered {
    pub item_id: ItemId,
    pub correct: bool,
    pub user_answer: String,
    pub expected_answer: String,
    pub confidence: Option<Confidence>,
    pub attempts: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemSkipped {
    pub item_id: ItemId,
    pub index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemHintUsed {
    pub item_id: ItemId,
    pub hint_level: u32,
    pub hint_content: String,
    /// Fraction of the eventual score forfeited so far, in `[0, 1)`.
    pub penalty_applied: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProgressUpdated {
    pub current: usize,
    pub total: usize,
    pub correct: u32,
    pub incorrect: u32,
    pub skipped: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreakUpdated {
    pub current: u32,
    pub best: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionPaused {
    pub current_index: usize,
    pub time_elapsed_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionResumed {
    pub pause_duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeoutWarning {
    /// Time left before the session is auto-paused.
    pub remaining_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionCompleted {
    pub session_id: SessionId,
    pub statistics: SessionStatistics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionAbandoned {
    pub reason: Option<String>,
    pub current_index: usize,
    pub completion_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AchievementUnlocked {
    pub achievement_id: String,
    pub name: String,
    pub description: String,
}

//
// ─── EVENT ─────────────────────────────────────────────────────────────────────
//

/// One published engine event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "payload")]
pub enum ReviewEvent {
    SessionStarted(SessionStarted),
    ItemPresented(ItemPresented),
    ItemAnswered(ItemAnswered),
    ItemSkipped(ItemSkipped),
    ItemHintUsed(ItemHintUsed),
    ProgressUpdated(ProgressUpdated),
    StreakUpdated(StreakUpdated),
    SessionPaused(SessionPaused),
    SessionResumed(SessionResumed),
    TimeoutWarning(TimeoutWarning),
    SessionCompleted(SessionCompleted),
    SessionAbandoned(SessionAbandoned),
    AchievementUnlocked(AchievementUnlocked),
}

impl ReviewEvent {
    /// The subscription discriminant for this event.
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::SessionStarted(_) => EventKind::SessionStarted,
            Self::ItemPresented(_) => EventKind::ItemPresented,
            Self::ItemAnswered(_) => EventKind::ItemAnswered,
            Self::ItemSkipped(_) => EventKind::ItemSkipped,
            Self::ItemHintUsed(_) => EventKind::ItemHintUsed,
            Self::ProgressUpdated(_) => EventKind::ProgressUpdated,
            Self::StreakUpdated(_) => EventKind::StreakUpdated,
            Self::SessionPaused(_) => EventKind::SessionPaused,
            Self::SessionResumed(_) => EventKind::SessionResumed,
            Self::TimeoutWarning(_) => EventKind::TimeoutWarning,
            Self::SessionCompleted(_) => EventKind::SessionCompleted,
            Self::SessionAbandoned(_) => EventKind::SessionAbandoned,
            Self::AchievementUnlocked(_) => EventKind::AchievementUnlocked,
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_matches_variant() {
        let event = ReviewEvent::StreakUpdated(StreakUpdated { current: 5, best: 5 });
        assert_eq!(event.kind(), EventKind::StreakUpdated);
        assert_eq!(event.kind().to_string(), "STREAK_UPDATED");
    }

    #[test]
    fn events_serialize_with_type_tag() {
        let event = ReviewEvent::TimeoutWarning(TimeoutWarning { remaining_ms: 60_000 });
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "TimeoutWarning");
        assert_eq!(json["payload"]["remaining_ms"], 60_000);
    }
}
