//! End-of-session achievement predicates.
//!
//! Evaluated once, from the finalized statistics, just before the
//! `SessionCompleted` event. Predicates only ever add events; they never
//! touch session state.

use recall_core::model::SessionStatistics;

/// Minimum completed items before accuracy- or speed-based achievements can
/// unlock. Short sessions are too easy to game.
const MIN_QUALIFYING_ITEMS: u32 = 10;

/// One unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Achievement {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

const PERFECT_SESSION: Achievement = Achievement {
    id: "perfect_session",
    name: "Perfect Session",
    description: "Answered every item correctly in a session of ten or more.",
};

const LIGHTNING_ROUND: Achievement = Achievement {
    id: "lightning_round",
    name: "Lightning Round",
    description: "Kept the average response under the fast-response threshold for a full session.",
};

/// Evaluate all predicates against finalized statistics.
#[must_use]
pub fn evaluate(stats: &SessionStatistics, fast_response_ms: u64) -> Vec<Achievement> {
    let mut unlocked = Vec::new();

    if stats.completed_items() >= MIN_QUALIFYING_ITEMS
        && stats.correct_items() == stats.completed_items()
    {
        unlocked.push(PERFECT_SESSION);
    }

    if stats.completed_items() >= MIN_QUALIFYING_ITEMS {
        let average_ms = stats.time_spent_ms() / u64::from(stats.completed_items());
        if average_ms < fast_response_ms {
            unlocked.push(LIGHTNING_ROUND);
        }
    }

    unlocked
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
