use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use recall_core::model::{
    BucketTally, Confidence, ContentKind, DifficultyBucket, ItemId, ReviewMode, ReviewSession,
    ReviewableContent, SessionId, SessionItem, SessionStatistics, SessionStatus, UserId,
};

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

//
// ─── PERSISTED SHAPES ──────────────────────────────────────────────────────────
//

/// Persisted shape for one session item.
///
/// Mirrors the domain `SessionItem` with flat fields so backends can
/// serialize it without leaking storage concerns into the domain layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: ItemId,
    pub kind: String,
    pub prompt: String,
    pub answer: String,
    pub alternatives: Vec<String>,
    pub difficulty: f64,
    pub hints: Vec<String>,
    pub presented_at: Option<DateTime<Utc>>,
    pub user_answer: Option<String>,
    pub correct: Option<bool>,
    pub confidence: Option<u8>,
    pub attempts: u32,
    pub response_time_ms: u64,
    pub hints_used: u32,
    pub skipped: bool,
    pub base_score: f64,
    pub final_score: f64,
    pub ease_factor: f64,
    pub previous_interval_days: f64,
    pub next_interval_days: f64,
}

impl ItemRecord {
    #[must_use]
    pub fn from_item(item: &SessionItem) -> Self {
        let content = item.content();
        Self {
            item_id: content.id().clone(),
            kind: content.kind().as_str().to_owned(),
            prompt: content.prompt().to_owned(),
            answer: content.answer().to_owned(),
            alternatives: content.alternatives().to_vec(),
            difficulty: content.difficulty(),
            hints: content.hints().to_vec(),
            presented_at: item.presented_at(),
            user_answer: item.user_answer().map(str::to_owned),
            correct: item.correct(),
            confidence: item.confidence().map(|c| c.level()),
            attempts: item.attempts(),
            response_time_ms: item.response_time_ms(),
            hints_used: item.hints_used(),
            skipped: item.is_skipped(),
            base_score: item.base_score(),
            final_score: item.final_score(),
            ease_factor: item.ease_factor(),
            previous_interval_days: item.previous_interval_days(),
            next_interval_days: item.next_interval_days(),
        }
    }

    /// Convert the record back into a domain `SessionItem`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored content or
    /// confidence no longer passes domain validation.
    pub fn into_item(self) -> Result<SessionItem, StorageError> {
        let kind =
            ContentKind::new(self.kind).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let content = ReviewableContent::new(
            self.item_id,
            kind,
            self.prompt,
            self.answer,
            self.difficulty,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))?
        .with_alternatives(self.alternatives)
        .with_hints(self.hints);

        let confidence = self
            .confidence
            .map(Confidence::from_u8)
            .transpose()
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        Ok(SessionItem::from_persisted(
            content,
            self.presented_at,
            self.user_answer,
            self.correct,
            confidence,
            self.attempts,
            self.response_time_ms,
            self.hints_used,
            self.skipped,
            self.base_score,
            self.final_score,
            self.ease_factor,
            self.previous_interval_days,
            self.next_interval_days,
        ))
    }
}

/// Persisted shape for a review session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub user_id: UserId,
    pub status: SessionStatus,
    pub mode: ReviewMode,
    pub current_index: usize,
    pub created_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub source: Option<String>,
    pub tags: Vec<String>,
    pub spaced_repetition: bool,
    pub items: Vec<ItemRecord>,
}

impl SessionRecord {
    #[must_use]
    pub fn from_session(session: &ReviewSession) -> Self {
        Self {
            id: session.id(),
            user_id: session.user_id().clone(),
            status: session.status(),
            mode: session.mode(),
            current_index: session.current_index(),
            created_at: session.created_at(),
            paused_at: session.paused_at(),
            source: session.source().map(str::to_owned),
            tags: session.tags().to_vec(),
            spaced_repetition: session.spaced_repetition(),
            items: session.items().iter().map(ItemRecord::from_item).collect(),
        }
    }

    /// Convert the record back into a domain `ReviewSession`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if any item fails validation or
    /// the stored index does not fit the item list.
    pub fn into_session(self) -> Result<ReviewSession, StorageError> {
        let items = self
            .items
            .into_iter()
            .map(ItemRecord::into_item)
            .collect::<Result<Vec<_>, _>>()?;

        ReviewSession::from_persisted(
            self.id,
            self.user_id,
            items,
            self.current_index,
            self.status,
            self.mode,
            self.created_at,
            self.paused_at,
            self.source,
            self.tags,
            self.spaced_repetition,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

/// Persisted shape for session statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticsRecord {
    pub session_id: SessionId,
    pub total_items: u32,
    pub completed_items: u32,
    pub correct_items: u32,
    pub incorrect_items: u32,
    pub skipped_items: u32,
    pub accuracy: f64,
    pub current_streak: u32,
    pub best_streak: u32,
    pub easy: BucketTally,
    pub medium: BucketTally,
    pub hard: BucketTally,
    pub time_spent_ms: u64,
    pub duration_ms: Option<u64>,
}

impl StatisticsRecord {
    #[must_use]
    pub fn from_statistics(session_id: SessionId, stats: &SessionStatistics) -> Self {
        Self {
            session_id,
            total_items: stats.total_items(),
            completed_items: stats.completed_items(),
            correct_items: stats.correct_items(),
            incorrect_items: stats.incorrect_items(),
            skipped_items: stats.skipped_items(),
            accuracy: stats.accuracy(),
            current_streak: stats.current_streak(),
            best_streak: stats.best_streak(),
            easy: stats.bucket(DifficultyBucket::Easy),
            medium: stats.bucket(DifficultyBucket::Medium),
            hard: stats.bucket(DifficultyBucket::Hard),
            time_spent_ms: stats.time_spent_ms(),
            duration_ms: stats.duration_ms(),
        }
    }

    /// Convert the record back into domain `SessionStatistics`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the stored counters do not
    /// align.
    pub fn into_statistics(self) -> Result<SessionStatistics, StorageError> {
        SessionStatistics::from_persisted(
            self.total_items,
            self.completed_items,
            self.correct_items,
            self.incorrect_items,
            self.skipped_items,
            self.current_streak,
            self.best_streak,
            self.easy,
            self.medium,
            self.hard,
            self.time_spent_ms,
            self.duration_ms,
        )
        .map_err(|e| StorageError::Serialization(e.to_string()))
    }
}

//
// ─── STORE CONTRACT ────────────────────────────────────────────────────────────
//

/// Storage port consumed by the session engine.
///
/// The engine treats only the `save_session` call made at session start as
/// fatal; every other failure is surfaced to the caller or logged without
/// aborting the in-memory transition.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Persist a newly created session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the session id already exists, or
    /// other storage errors.
    async fn save_session(&self, session: &SessionRecord) -> Result<(), StorageError>;

    /// Persist the current state of an existing session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the session cannot be stored.
    async fn update_session(&self, session: &SessionRecord) -> Result<(), StorageError>;

    /// Fetch a session by id, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure; a missing session is
    /// `Ok(None)`.
    async fn load_session(&self, id: SessionId) -> Result<Option<SessionRecord>, StorageError>;

    /// Remove a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the session does not exist.
    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError>;

    /// Persist final statistics for a session.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the statistics cannot be stored.
    async fn save_statistics(&self, stats: &StatisticsRecord) -> Result<(), StorageError>;

    /// Fetch statistics for a session, if present.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure; missing statistics are
    /// `Ok(None)`.
    async fn load_statistics(
        &self,
        id: SessionId,
    ) -> Result<Option<StatisticsRecord>, StorageError>;

    /// Fetch the active session for a user, if any.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failure.
    async fn get_active_session(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionRecord>, StorageError>;
}

//
// ─── IN-MEMORY STORE ───────────────────────────────────────────────────────────
//

/// Simple in-memory store implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemorySessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, SessionRecord>>>,
    statistics: Arc<Mutex<HashMap<SessionId, StatisticsRecord>>>,
}

impl InMemorySessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn save_session(&self, session: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard.contains_key(&session.id) {
            return Err(StorageError::Conflict);
        }
        guard.insert(session.id, session.clone());
        Ok(())
    }

    async fn update_session(&self, session: &SessionRecord) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(session.id, session.clone());
        Ok(())
    }

    async fn load_session(&self, id: SessionId) -> Result<Option<SessionRecord>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn delete_session(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id).map(|_| ()).ok_or(StorageError::NotFound)
    }

    async fn save_statistics(&self, stats: &StatisticsRecord) -> Result<(), StorageError> {
        let mut guard = self
            .statistics
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(stats.session_id, stats.clone());
        Ok(())
    }

    async fn load_statistics(
        &self,
        id: SessionId,
    ) -> Result<Option<StatisticsRecord>, StorageError> {
        let guard = self
            .statistics
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn get_active_session(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SessionRecord>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard
            .values()
            .find(|record| record.user_id == *user_id && record.status == SessionStatus::Active)
            .cloned())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use recall_core::time::fixed_now;

    fn build_session(user: &str) -> ReviewSession {
        let content = ReviewableContent::new(
            ItemId::new("vocab-1"),
            ContentKind::new("vocabulary").unwrap(),
            "to drink",
            "nomu",
            0.3,
        )
        .unwrap()
        .with_alternatives(vec!["to drink".to_string()]);

        ReviewSession::new(
            SessionId::new(),
            UserId::new(user).unwrap(),
            vec![SessionItem::new(content)],
            ReviewMode::Recognition,
            true,
            fixed_now(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn session_round_trips_through_records() {
        let store = InMemorySessionStore::new();
        let mut session = build_session("user-1");
        session
            .current_item_mut()
            .unwrap()
            .apply_answer("nomu", true, Confidence::from_u8(4).ok(), 1_200);
        session.advance();

        store
            .save_session(&SessionRecord::from_session(&session))
            .await
            .unwrap();

        let loaded = store
            .load_session(session.id())
            .await
            .unwrap()
            .unwrap()
            .into_session()
            .unwrap();

        assert_eq!(loaded.id(), session.id());
        assert_eq!(loaded.current_index(), 1);
        assert_eq!(loaded.items()[0].user_answer(), Some("nomu"));
        assert_eq!(loaded.items()[0].attempts(), 1);
    }

    #[tokio::test]
    async fn save_session_rejects_duplicate_ids() {
        let store = InMemorySessionStore::new();
        let session = build_session("user-1");
        let record = SessionRecord::from_session(&session);

        store.save_session(&record).await.unwrap();
        let err = store.save_session(&record).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict));
    }

    #[tokio::test]
    async fn update_session_overwrites() {
        let store = InMemorySessionStore::new();
        let mut session = build_session("user-1");
        store
            .save_session(&SessionRecord::from_session(&session))
            .await
            .unwrap();

        session.advance();
        store
            .update_session(&SessionRecord::from_session(&session))
            .await
            .unwrap();

        let loaded = store.load_session(session.id()).await.unwrap().unwrap();
        assert_eq!(loaded.current_index, 1);
    }

    #[tokio::test]
    async fn delete_session_requires_existence() {
        let store = InMemorySessionStore::new();
        let err = store.delete_session(SessionId::new()).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn get_active_session_filters_by_user_and_status() {
        let store = InMemorySessionStore::new();
        let mut paused = build_session("user-1");
        paused.pause(fixed_now()).unwrap();
        store
            .save_session(&SessionRecord::from_session(&paused))
            .await
            .unwrap();

        let active = build_session("user-1");
        store
            .save_session(&SessionRecord::from_session(&active))
            .await
            .unwrap();

        let other = build_session("user-2");
        store
            .save_session(&SessionRecord::from_session(&other))
            .await
            .unwrap();

        let found = store
            .get_active_session(&UserId::new("user-1").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, active.id());
    }

    #[tokio::test]
    async fn statistics_round_trip() {
        let store = InMemorySessionStore::new();
        let session_id = SessionId::new();
        let mut stats = SessionStatistics::new(2);
        stats.record_answer(true, DifficultyBucket::Medium, 900);
        stats.record_answer(false, DifficultyBucket::Hard, 2_100);
        stats.finalize(30_000);

        store
            .save_statistics(&StatisticsRecord::from_statistics(session_id, &stats))
            .await
            .unwrap();

        let loaded = store
            .load_statistics(session_id)
            .await
            .unwrap()
            .unwrap()
            .into_statistics()
            .unwrap();

        assert_eq!(loaded, stats);
        assert!(store
            .load_statistics(SessionId::new())
            .await
            .unwrap()
            .is_none());
    }
}
