//! The session state machine.
//!
//! One engine instance owns at most one in-flight `ReviewSession` and its
//! `SessionStatistics`. Every public operation runs to completion before the
//! next is accepted; callers that share an engine across tasks wrap it in a
//! `tokio::sync::Mutex`. In-memory transitions and event emission are
//! synchronous; an event is never published from a partially-updated
//! session. Only the storage and analytics ports are async, and of those
//! only the initial save is awaited fatally.

use rand::seq::SliceRandom;
use serde::Serialize;
use std::sync::Arc;

use recall_core::Clock;
use recall_core::events::{
    AchievementUnlocked, ItemAnswered, ItemHintUsed, ItemPresented, ItemSkipped, ProgressUpdated,
    ReviewEvent, SessionAbandoned, SessionCompleted, SessionPaused, SessionResumed,
    SessionStarted, StreakUpdated, TimeoutWarning,
};
use recall_core::model::{
    Confidence, ReviewMode, ReviewSession, ReviewableContent, SessionId, SessionItem,
    SessionStatistics, SessionStatus, UserId,
};
use recall_core::scoring;
use recall_core::srs::{self, SrsState};
use recall_core::time::elapsed_ms;
use recall_storage::{SessionRecord, SessionStore, StatisticsRecord};

use crate::achievements;
use crate::analytics::AnalyticsSink;
use crate::bus::EventBus;
use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::timer::{InactivitySignal, InactivityTimer};

//
// ─── PUBLIC TYPES ──────────────────────────────────────────────────────────────
//

/// Per-session options supplied at start.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Shuffle the item order once at creation. The multiset of items is
    /// preserved exactly.
    pub shuffle: bool,
    /// Enable spaced-repetition updates on answered items.
    pub spaced_repetition: bool,
    /// Where the items came from (deck, lesson, API import).
    pub source: Option<String>,
    pub tags: Vec<String>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            shuffle: false,
            spaced_repetition: true,
            source: None,
            tags: Vec::new(),
        }
    }
}

/// What `submit_answer` reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerOutcome {
    pub correct: bool,
    pub expected_answer: String,
    pub feedback: Option<String>,
}

/// What `use_hint` reports back to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HintOutcome {
    pub level: u32,
    pub content: String,
}

struct ActiveState {
    session: ReviewSession,
    statistics: SessionStatistics,
}

//
// ─── ENGINE ────────────────────────────────────────────────────────────────────
//

/// Drives a timed sequence of question/answer interactions over one owned
/// session, publishing typed events for the UI, analytics adapters, and
/// achievement checks.
pub struct SessionEngine {
    clock: Clock,
    config: EngineConfig,
    bus: Arc<EventBus>,
    store: Arc<dyn SessionStore>,
    analytics: Arc<dyn AnalyticsSink>,
    timer: InactivityTimer,
    active: Option<ActiveState>,
}

impl SessionEngine {
    #[must_use]
    pub fn new(clock: Clock, store: Arc<dyn SessionStore>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self::with_config(clock, store, analytics, EngineConfig::default())
    }

    #[must_use]
    pub fn with_config(
        clock: Clock,
        store: Arc<dyn SessionStore>,
        analytics: Arc<dyn AnalyticsSink>,
        config: EngineConfig,
    ) -> Self {
        Self {
            clock,
            config,
            bus: Arc::new(EventBus::new()),
            store,
            analytics,
            timer: InactivityTimer::new(config.warning_after_ms, config.grace_period_ms),
            active: None,
        }
    }

    /// The bus this engine publishes on. Subscribe before starting a session
    /// to observe `SessionStarted`.
    #[must_use]
    pub fn bus(&self) -> Arc<EventBus> {
        Arc::clone(&self.bus)
    }

    #[must_use]
    pub fn config(&self) -> EngineConfig {
        self.config
    }

    /// Mutable access to the injected clock, so virtual-time harnesses can
    /// advance it between operations instead of sleeping.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// Read-only view of the owned session, if any.
    #[must_use]
    pub fn session(&self) -> Option<&ReviewSession> {
        self.active.as_ref().map(|state| &state.session)
    }

    /// Read-only view of the owned statistics, if any.
    #[must_use]
    pub fn statistics(&self) -> Option<&SessionStatistics> {
        self.active.as_ref().map(|state| &state.statistics)
    }

    #[must_use]
    pub fn status(&self) -> Option<SessionStatus> {
        self.active.as_ref().map(|state| state.session.status())
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────
    //

    /// Start a session over the supplied content.
    ///
    /// The initial persistence call is awaited: a session must never exist
    /// only in memory, so a storage failure here fails the whole call and
    /// leaves the engine without a session. Analytics delivery is
    /// fire-and-forget.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::SessionAlreadyActive` if a session is owned,
    /// `EngineError::EmptySession` for an empty item list, and
    /// `EngineError::Persistence` if the initial save fails.
    pub async fn start_session(
        &mut self,
        user_id: UserId,
        items: Vec<ReviewableContent>,
        mode: ReviewMode,
        options: SessionOptions,
    ) -> Result<SessionId, EngineError> {
        if self.active.is_some() {
            return Err(EngineError::SessionAlreadyActive);
        }
        if items.is_empty() {
            return Err(EngineError::EmptySession);
        }

        let now = self.clock.now();
        let mut session_items: Vec<SessionItem> =
            items.into_iter().map(SessionItem::new).collect();
        if options.shuffle {
            session_items.shuffle(&mut rand::rng());
        }

        let session = ReviewSession::new(
            SessionId::new(),
            user_id,
            session_items,
            mode,
            options.spaced_repetition,
            now,
        )
        .map_err(|_| EngineError::EmptySession)?
        .with_source(options.source)
        .with_tags(options.tags);

        let record = SessionRecord::from_session(&session);
        self.store.save_session(&record).await?;

        let id = session.id();
        let started = SessionStarted {
            session_id: id,
            item_count: session.item_count(),
            mode: session.mode(),
            content_kinds: session.content_kinds(),
        };
        let statistics =
            SessionStatistics::new(u32::try_from(session.item_count()).unwrap_or(u32::MAX));

        self.timer.arm(now);
        self.active = Some(ActiveState {
            session,
            statistics,
        });
        self.spawn_analytics_start(record);
        self.bus.publish(&ReviewEvent::SessionStarted(started));
        Ok(id)
    }

    /// Finalize and persist the owned session, returning its statistics.
    ///
    /// Persistence failures here are logged, not propagated: the in-memory
    /// completion already happened and the caller gets its snapshot.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned.
    pub async fn complete_session(&mut self) -> Result<SessionStatistics, EngineError> {
        let now = self.clock.now();
        let mut state = self.active.take().ok_or(EngineError::NoActiveSession)?;
        self.timer.disarm();

        state
            .session
            .complete()
            .map_err(|_| EngineError::NoActiveSession)?;
        state
            .statistics
            .finalize(elapsed_ms(state.session.created_at(), now));

        let session_id = state.session.id();
        let record = SessionRecord::from_session(&state.session);
        let stats_record = StatisticsRecord::from_statistics(session_id, &state.statistics);
        let statistics = state.statistics;

        if let Err(err) = self.store.update_session(&record).await {
            tracing::warn!(session = %session_id, error = %err, "failed to persist completed session");
        }
        if let Err(err) = self.store.save_statistics(&stats_record).await {
            tracing::warn!(session = %session_id, error = %err, "failed to persist session statistics");
        }
        self.spawn_analytics_complete(statistics.clone());

        for achievement in achievements::evaluate(&statistics, self.config.fast_response_ms) {
            self.bus
                .publish(&ReviewEvent::AchievementUnlocked(AchievementUnlocked {
                    achievement_id: achievement.id.to_string(),
                    name: achievement.name.to_string(),
                    description: achievement.description.to_string(),
                }));
        }
        self.bus.publish(&ReviewEvent::SessionCompleted(SessionCompleted {
            session_id,
            statistics: statistics.clone(),
        }));

        Ok(statistics)
    }

    /// Drop the owned session without requiring every item to be answered.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned; the
    /// missing-session policy is uniform across all operations.
    pub async fn abandon_session(&mut self, reason: Option<String>) -> Result<(), EngineError> {
        let mut state = self.active.take().ok_or(EngineError::NoActiveSession)?;
        self.timer.disarm();

        state
            .session
            .abandon()
            .map_err(|_| EngineError::NoActiveSession)?;

        let payload = SessionAbandoned {
            reason,
            current_index: state.session.current_index(),
            completion_percent: state.session.completion_percent(),
        };
        let record = SessionRecord::from_session(&state.session);

        self.spawn_persist_update(record);
        self.bus.publish(&ReviewEvent::SessionAbandoned(payload));
        Ok(())
    }

    /// Pause the active session and stop the inactivity timer.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned, or
    /// `EngineError::SessionState` unless the session is active.
    pub async fn pause_session(&mut self) -> Result<(), EngineError> {
        let now = self.clock.now();
        let state = self.active.as_mut().ok_or(EngineError::NoActiveSession)?;

        let actual = state.session.status();
        state.session.pause(now).map_err(|_| EngineError::SessionState {
            expected: SessionStatus::Active,
            actual,
        })?;

        let payload = SessionPaused {
            current_index: state.session.current_index(),
            time_elapsed_ms: elapsed_ms(state.session.created_at(), now),
        };
        let record = SessionRecord::from_session(&state.session);

        self.timer.disarm();
        self.bus.publish(&ReviewEvent::SessionPaused(payload));
        self.spawn_persist_update(record);
        Ok(())
    }

    /// Resume a paused session and restart the inactivity timer.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned, or
    /// `EngineError::SessionState` unless the session is paused.
    pub async fn resume_session(&mut self) -> Result<(), EngineError> {
        let now = self.clock.now();
        let state = self.active.as_mut().ok_or(EngineError::NoActiveSession)?;

        let actual = state.session.status();
        let paused_at = state.session.resume().map_err(|_| EngineError::SessionState {
            expected: SessionStatus::Paused,
            actual,
        })?;

        let payload = SessionResumed {
            pause_duration_ms: paused_at.map_or(0, |at| elapsed_ms(at, now)),
        };
        let record = SessionRecord::from_session(&state.session);

        self.timer.arm(now);
        self.bus.publish(&ReviewEvent::SessionResumed(payload));
        self.spawn_persist_update(record);
        Ok(())
    }

    //
    // ─── ITEM FLOW ─────────────────────────────────────────────────────────
    //

    /// The item at the current index, or `None` past the end.
    ///
    /// The first read of a given item stamps its presentation time and
    /// publishes `ItemPresented`; later reads are side-effect-free.
    pub fn current_item(&mut self) -> Option<&SessionItem> {
        let now = self.clock.now();
        let presented = {
            let state = self.active.as_mut()?;
            let index = state.session.current_index();
            let total = state.session.item_count();
            let item = state.session.current_item_mut()?;
            if item.mark_presented(now) {
                Some(ReviewEvent::ItemPresented(ItemPresented {
                    item_id: item.content().id().clone(),
                    kind: item.content().kind().clone(),
                    index,
                    total,
                }))
            } else {
                None
            }
        };

        if let Some(event) = presented {
            self.bus.publish(&event);
        }
        self.active
            .as_ref()
            .and_then(|state| state.session.current_item())
    }

    /// Validate and score an answer for the current item.
    ///
    /// Does not advance the index; call `next_item` once the caller has
    /// shown its feedback.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned or the
    /// index is past the end, and `EngineError::SessionState` while paused.
    pub async fn submit_answer(
        &mut self,
        answer: &str,
        confidence: Option<Confidence>,
    ) -> Result<AnswerOutcome, EngineError> {
        let now = self.clock.now();
        let config = self.config;

        let state = self.active.as_mut().ok_or(EngineError::NoActiveSession)?;
        require_active(&state.session)?;

        let spaced = state.session.spaced_repetition();
        let total = state.session.item_count();
        let index = state.session.current_index();
        let Some(item) = state.session.current_item_mut() else {
            return Err(EngineError::NoActiveSession);
        };

        let response_time_ms = item.presented_at().map_or(0, |at| elapsed_ms(at, now));
        let correct = item.content().accepts(answer);
        let matched_alternative = item.content().matched_alternative(answer);

        item.apply_answer(answer.trim(), correct, confidence, response_time_ms);
        item.apply_score(scoring::score_answer(
            correct,
            response_time_ms,
            confidence,
            item.hints_used(),
            config.fast_response_ms,
        ));
        if spaced {
            let prior = SrsState::new(item.ease_factor(), item.previous_interval_days());
            item.apply_srs(srs::review(&prior, correct, confidence));
        }

        let expected_answer = item.content().answer().to_string();
        let answered = ItemAnswered {
            item_id: item.content().id().clone(),
            correct,
            user_answer: answer.trim().to_string(),
            expected_answer: expected_answer.clone(),
            confidence,
            attempts: item.attempts(),
        };
        let bucket = item.content().bucket();

        let prev_streak = state.statistics.current_streak();
        let streak = state
            .statistics
            .record_answer(correct, bucket, response_time_ms);
        let best = state.statistics.best_streak();
        let progress = ProgressUpdated {
            current: index,
            total,
            correct: state.statistics.correct_items(),
            incorrect: state.statistics.incorrect_items(),
            skipped: state.statistics.skipped_items(),
        };
        let record = SessionRecord::from_session(&state.session);

        // Timer reset comes strictly before any event so a timeout can never
        // interleave with a just-submitted answer.
        self.timer.reset(now);
        self.bus.publish(&ReviewEvent::ItemAnswered(answered.clone()));
        self.bus.publish(&ReviewEvent::ProgressUpdated(progress));
        if correct && streak % config.streak_milestone.max(1) == 0 {
            self.bus
                .publish(&ReviewEvent::StreakUpdated(StreakUpdated {
                    current: streak,
                    best,
                }));
        } else if !correct && prev_streak > 0 {
            self.bus
                .publish(&ReviewEvent::StreakUpdated(StreakUpdated {
                    current: 0,
                    best,
                }));
        }

        self.spawn_persist_update(record);
        self.spawn_analytics_answer(answered);

        let feedback = matched_alternative.then(|| {
            format!("Also accepted. The primary answer is \"{expected_answer}\".")
        });
        Ok(AnswerOutcome {
            correct,
            expected_answer,
            feedback,
        })
    }

    /// Consume one hint for the current item and return its content.
    ///
    /// The compounding penalty is applied when the answer is scored, not
    /// here; the published event carries the fraction forfeited so far.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned or the
    /// index is past the end, and `EngineError::SessionState` while paused.
    pub fn use_hint(&mut self) -> Result<HintOutcome, EngineError> {
        let now = self.clock.now();
        let state = self.active.as_mut().ok_or(EngineError::NoActiveSession)?;
        require_active(&state.session)?;

        let Some(item) = state.session.current_item_mut() else {
            return Err(EngineError::NoActiveSession);
        };

        let level = item.record_hint();
        let content = hint_content(item.content(), level);
        let payload = ItemHintUsed {
            item_id: item.content().id().clone(),
            hint_level: level,
            hint_content: content.clone(),
            penalty_applied: 1.0 - scoring::hint_penalty(level),
        };

        self.timer.reset(now);
        self.bus.publish(&ReviewEvent::ItemHintUsed(payload));
        Ok(HintOutcome { level, content })
    }

    /// Skip the current item and advance. Skipped items stay out of the
    /// correct/incorrect counts.
    ///
    /// Returns final statistics when skipping the last item completes the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned or the
    /// index is past the end, and `EngineError::SessionState` while paused.
    pub async fn skip_item(&mut self) -> Result<Option<SessionStatistics>, EngineError> {
        let now = self.clock.now();
        let state = self.active.as_mut().ok_or(EngineError::NoActiveSession)?;
        require_active(&state.session)?;

        let index = state.session.current_index();
        let Some(item) = state.session.current_item_mut() else {
            return Err(EngineError::NoActiveSession);
        };
        item.mark_skipped();
        let skipped = ItemSkipped {
            item_id: item.content().id().clone(),
            index,
        };

        let prev_streak = state.statistics.current_streak();
        state.statistics.record_skip();
        let best = state.statistics.best_streak();

        self.timer.reset(now);
        self.bus.publish(&ReviewEvent::ItemSkipped(skipped));
        if prev_streak > 0 {
            self.bus
                .publish(&ReviewEvent::StreakUpdated(StreakUpdated {
                    current: 0,
                    best,
                }));
        }
        self.advance_and_maybe_complete().await
    }

    /// Advance to the next item. Reaching the end of the list completes the
    /// session automatically and returns the final statistics.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::NoActiveSession` if no session is owned, and
    /// `EngineError::SessionState` while paused.
    pub async fn next_item(&mut self) -> Result<Option<SessionStatistics>, EngineError> {
        let state = self.active.as_ref().ok_or(EngineError::NoActiveSession)?;
        require_active(&state.session)?;
        self.advance_and_maybe_complete().await
    }

    /// Poll the inactivity timer against the engine clock.
    ///
    /// Publishes `TimeoutWarning` once per idle stretch, then auto-pauses
    /// the session after the grace period with no caller involvement. A
    /// no-op whenever the timer is disarmed, so stray driver ticks after
    /// pause, completion, or abandonment do nothing.
    pub fn tick(&mut self) {
        let now = self.clock.now();
        let Some(signal) = self.timer.poll(now) else {
            return;
        };

        match signal {
            InactivitySignal::Warning { remaining_ms } => {
                self.bus
                    .publish(&ReviewEvent::TimeoutWarning(TimeoutWarning { remaining_ms }));
            }
            InactivitySignal::Expired => {
                let paused = {
                    let Some(state) = self.active.as_mut() else {
                        return;
                    };
                    if state.session.pause(now).is_err() {
                        return;
                    }
                    SessionPaused {
                        current_index: state.session.current_index(),
                        time_elapsed_ms: elapsed_ms(state.session.created_at(), now),
                    }
                };
                self.bus.publish(&ReviewEvent::SessionPaused(paused));
            }
        }
    }

    //
    // ─── INTERNAL ──────────────────────────────────────────────────────────
    //

    async fn advance_and_maybe_complete(
        &mut self,
    ) -> Result<Option<SessionStatistics>, EngineError> {
        let state = self.active.as_mut().ok_or(EngineError::NoActiveSession)?;
        state.session.advance();

        let progress = ProgressUpdated {
            current: state.session.current_index(),
            total: state.session.item_count(),
            correct: state.statistics.correct_items(),
            incorrect: state.statistics.incorrect_items(),
            skipped: state.statistics.skipped_items(),
        };
        let exhausted = state.session.is_exhausted();
        let record = SessionRecord::from_session(&state.session);

        self.bus.publish(&ReviewEvent::ProgressUpdated(progress));

        if exhausted {
            return self.complete_session().await.map(Some);
        }
        self.spawn_persist_update(record);
        Ok(None)
    }

    fn spawn_persist_update(&self, record: SessionRecord) {
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if let Err(err) = store.update_session(&record).await {
                tracing::warn!(session = %record.id, error = %err, "failed to persist session update");
            }
        });
    }

    fn spawn_analytics_start(&self, record: SessionRecord) {
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(err) = analytics.track_session_start(record).await {
                tracing::debug!(error = %err, "analytics session-start delivery failed");
            }
        });
    }

    fn spawn_analytics_answer(&self, answered: ItemAnswered) {
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(err) = analytics.track_answer(answered).await {
                tracing::debug!(error = %err, "analytics answer delivery failed");
            }
        });
    }

    fn spawn_analytics_complete(&self, statistics: SessionStatistics) {
        let analytics = Arc::clone(&self.analytics);
        tokio::spawn(async move {
            if let Err(err) = analytics.track_session_complete(statistics).await {
                tracing::debug!(error = %err, "analytics completion delivery failed");
            }
        });
    }
}

fn require_active(session: &ReviewSession) -> Result<(), EngineError> {
    match session.status() {
        SessionStatus::Active => Ok(()),
        actual => Err(EngineError::SessionState {
            expected: SessionStatus::Active,
            actual,
        }),
    }
}

/// Hint content for one hint level: authored hints first, then derived
/// reveals of the expected answer.
fn hint_content(content: &ReviewableContent, level: u32) -> String {
    let authored = content.hints();
    let index = level.saturating_sub(1) as usize;
    if let Some(hint) = authored.get(index) {
        return hint.clone();
    }

    let answer = content.answer();
    let chars: Vec<char> = answer.chars().collect();
    let derived_level = index - authored.len();
    match derived_level {
        0 => {
            let first = chars.first().copied().unwrap_or('?');
            format!("{} characters, starting with '{first}'", chars.len())
        }
        1 => {
            let half = chars.len().div_ceil(2);
            let revealed: String = chars[..half].iter().collect();
            format!("Starts with \"{revealed}\"")
        }
        _ => format!("The answer is \"{answer}\""),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::model::{ContentKind, ItemId};
    use recall_core::time::{fixed_clock, fixed_now};
    use recall_storage::InMemorySessionStore;

    use crate::analytics::NullAnalytics;

    fn content(id: &str, answer: &str) -> ReviewableContent {
        ReviewableContent::new(
            ItemId::new(id),
            ContentKind::new("vocabulary").unwrap(),
            "prompt",
            answer,
            0.5,
        )
        .unwrap()
    }

    fn engine() -> SessionEngine {
        SessionEngine::new(
            fixed_clock(),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(NullAnalytics),
        )
    }

    async fn started_engine(items: Vec<ReviewableContent>) -> SessionEngine {
        let mut engine = engine();
        engine
            .start_session(
                UserId::new("user-1").unwrap(),
                items,
                ReviewMode::Recognition,
                SessionOptions::default(),
            )
            .await
            .unwrap();
        engine
    }

    #[tokio::test]
    async fn start_rejects_second_session() {
        let mut engine = started_engine(vec![content("a", "ichi")]).await;
        let err = engine
            .start_session(
                UserId::new("user-1").unwrap(),
                vec![content("b", "ni")],
                ReviewMode::Recall,
                SessionOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::SessionAlreadyActive));
        // The original session is untouched.
        assert_eq!(engine.session().unwrap().current_index(), 0);
    }

    #[tokio::test]
    async fn start_rejects_empty_item_list() {
        let mut engine = engine();
        let err = engine
            .start_session(
                UserId::new("user-1").unwrap(),
                Vec::new(),
                ReviewMode::Recognition,
                SessionOptions::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::EmptySession));
    }

    #[tokio::test]
    async fn current_item_stamps_presentation_once() {
        let mut engine = started_engine(vec![content("a", "ichi")]).await;

        let first = engine.current_item().unwrap().presented_at();
        assert_eq!(first, Some(fixed_now()));
        let second = engine.current_item().unwrap().presented_at();
        assert_eq!(second, first);
    }

    #[tokio::test]
    async fn operations_without_session_throw_uniformly() {
        let mut engine = engine();
        assert!(matches!(
            engine.submit_answer("x", None).await.unwrap_err(),
            EngineError::NoActiveSession
        ));
        assert!(matches!(
            engine.skip_item().await.unwrap_err(),
            EngineError::NoActiveSession
        ));
        assert!(matches!(
            engine.use_hint().unwrap_err(),
            EngineError::NoActiveSession
        ));
        assert!(matches!(
            engine.abandon_session(None).await.unwrap_err(),
            EngineError::NoActiveSession
        ));
        assert!(matches!(
            engine.complete_session().await.unwrap_err(),
            EngineError::NoActiveSession
        ));
    }

    #[tokio::test]
    async fn answering_while_paused_is_a_state_error() {
        let mut engine = started_engine(vec![content("a", "ichi")]).await;
        engine.pause_session().await.unwrap();

        let err = engine.submit_answer("ichi", None).await.unwrap_err();
        assert!(matches!(
            err,
            EngineError::SessionState {
                expected: SessionStatus::Active,
                actual: SessionStatus::Paused,
            }
        ));
    }

    #[tokio::test]
    async fn hints_walk_authored_then_derived_content() {
        let items = vec![
            ReviewableContent::new(
                ItemId::new("a"),
                ContentKind::new("vocabulary").unwrap(),
                "prompt",
                "sakura",
                0.5,
            )
            .unwrap()
            .with_hints(vec!["It blooms in spring.".to_string()]),
        ];
        let mut engine = started_engine(items).await;

        let first = engine.use_hint().unwrap();
        assert_eq!(first.level, 1);
        assert_eq!(first.content, "It blooms in spring.");

        let second = engine.use_hint().unwrap();
        assert_eq!(second.content, "6 characters, starting with 's'");

        let third = engine.use_hint().unwrap();
        assert_eq!(third.content, "Starts with \"sak\"");

        let fourth = engine.use_hint().unwrap();
        assert_eq!(fourth.content, "The answer is \"sakura\"");
    }

    #[tokio::test]
    async fn alternative_match_reports_primary_in_feedback() {
        let items = vec![content("a", "inu").with_alternatives(vec!["dog".to_string()])];
        let mut engine = started_engine(items).await;
        engine.current_item();

        let outcome = engine.submit_answer("DOG", None).await.unwrap();
        assert!(outcome.correct);
        assert_eq!(outcome.expected_answer, "inu");
        assert!(outcome.feedback.unwrap().contains("inu"));
    }

    #[tokio::test]
    async fn shuffle_preserves_the_item_multiset() {
        let items: Vec<ReviewableContent> = (0..12)
            .map(|i| content(&format!("item-{i}"), &format!("answer-{i}")))
            .collect();
        let mut expected: Vec<String> = items
            .iter()
            .map(|c| c.id().as_str().to_string())
            .collect();
        expected.sort();

        let mut engine = engine();
        engine
            .start_session(
                UserId::new("user-1").unwrap(),
                items,
                ReviewMode::Mixed,
                SessionOptions {
                    shuffle: true,
                    ..SessionOptions::default()
                },
            )
            .await
            .unwrap();

        let mut actual: Vec<String> = engine
            .session()
            .unwrap()
            .items()
            .iter()
            .map(|item| item.content().id().as_str().to_string())
            .collect();
        actual.sort();
        assert_eq!(actual, expected);
    }
}
