use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::content::ContentKind;
use crate::model::ids::{SessionId, UserId};
use crate::model::item::SessionItem;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("a session needs at least one item")]
    NoItems,

    #[error("current index {index} is out of bounds for {len} items")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("invalid transition from {from} to {to}")]
    InvalidTransition {
        from: SessionStatus,
        to: SessionStatus,
    },
}

//
// ─── STATUS & MODE ─────────────────────────────────────────────────────────────
//

/// Lifecycle status of a review session.
///
/// `Completed` and `Abandoned` are terminal; the engine drops the session
/// once either is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Paused,
    Completed,
    Abandoned,
}

impl SessionStatus {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Abandoned)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Active => "active",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        };
        write!(f, "{label}")
    }
}

/// What kind of recall the session exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Shown the item, recall the meaning.
    Recognition,
    /// Shown the meaning, produce the item.
    Recall,
    /// Audio prompt.
    Listening,
    /// Interleaved mix of the above.
    Mixed,
}

impl fmt::Display for ReviewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Recognition => "recognition",
            Self::Recall => "recall",
            Self::Listening => "listening",
            Self::Mixed => "mixed",
        };
        write!(f, "{label}")
    }
}

//
// ─── REVIEW SESSION ────────────────────────────────────────────────────────────
//

/// Owning aggregate for one run through a list of session items.
///
/// The item order is fixed at creation (any shuffle happens before
/// construction) and `current_index` only ever moves forward. All mutation
/// goes through the engine; readers get consistent snapshots via the
/// accessors.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewSession {
    id: SessionId,
    user_id: UserId,
    items: Vec<SessionItem>,
    current_index: usize,
    status: SessionStatus,
    mode: ReviewMode,
    created_at: DateTime<Utc>,
    paused_at: Option<DateTime<Utc>>,
    source: Option<String>,
    tags: Vec<String>,
    spaced_repetition: bool,
}

impl ReviewSession {
    /// Create a fresh active session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoItems` for an empty item list.
    pub fn new(
        id: SessionId,
        user_id: UserId,
        items: Vec<SessionItem>,
        mode: ReviewMode,
        spaced_repetition: bool,
        created_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::NoItems);
        }

        Ok(Self {
            id,
            user_id,
            items,
            current_index: 0,
            status: SessionStatus::Active,
            mode,
            created_at,
            paused_at: None,
            source: None,
            tags: Vec::new(),
            spaced_repetition,
        })
    }

    /// Attach optional source metadata (e.g. the deck or lesson the items
    /// came from).
    #[must_use]
    pub fn with_source(mut self, source: Option<String>) -> Self {
        self.source = source;
        self
    }

    #[must_use]
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Rehydrate a session from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoItems` for an empty item list and
    /// `SessionError::IndexOutOfBounds` if the index does not fit the items.
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: SessionId,
        user_id: UserId,
        items: Vec<SessionItem>,
        current_index: usize,
        status: SessionStatus,
        mode: ReviewMode,
        created_at: DateTime<Utc>,
        paused_at: Option<DateTime<Utc>>,
        source: Option<String>,
        tags: Vec<String>,
        spaced_repetition: bool,
    ) -> Result<Self, SessionError> {
        if items.is_empty() {
            return Err(SessionError::NoItems);
        }
        if current_index > items.len() {
            return Err(SessionError::IndexOutOfBounds {
                index: current_index,
                len: items.len(),
            });
        }

        Ok(Self {
            id,
            user_id,
            items,
            current_index,
            status,
            mode,
            created_at,
            paused_at,
            source,
            tags,
            spaced_repetition,
        })
    }

    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn mode(&self) -> ReviewMode {
        self.mode
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub fn paused_at(&self) -> Option<DateTime<Utc>> {
        self.paused_at
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub fn spaced_repetition(&self) -> bool {
        self.spaced_repetition
    }

    #[must_use]
    pub fn items(&self) -> &[SessionItem] {
        &self.items
    }

    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// The item at the current index, or `None` once the index has moved
    /// past the end.
    #[must_use]
    pub fn current_item(&self) -> Option<&SessionItem> {
        self.items.get(self.current_index)
    }

    /// Mutable access to the current item, for the engine.
    pub fn current_item_mut(&mut self) -> Option<&mut SessionItem> {
        self.items.get_mut(self.current_index)
    }

    /// Whether the index has moved past the last item.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.current_index >= self.items.len()
    }

    /// Percentage of items the index has moved past, in `[0, 100]`.
    #[must_use]
    pub fn completion_percent(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let fraction = self.current_index as f64 / self.items.len() as f64;
        fraction * 100.0
    }

    /// Distinct content kinds across the session's items, in first-seen
    /// order.
    #[must_use]
    pub fn content_kinds(&self) -> Vec<ContentKind> {
        let mut kinds: Vec<ContentKind> = Vec::new();
        for item in &self.items {
            let kind = item.content().kind();
            if !kinds.contains(kind) {
                kinds.push(kind.clone());
            }
        }
        kinds
    }

    /// Advance the index by one, saturating at the item count. Returns the
    /// new index.
    pub fn advance(&mut self) -> usize {
        if self.current_index < self.items.len() {
            self.current_index += 1;
        }
        self.current_index
    }

    /// Transition `Active` → `Paused`, recording the pause timestamp.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is
    /// active.
    pub fn pause(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        if self.status != SessionStatus::Active {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: SessionStatus::Paused,
            });
        }
        self.status = SessionStatus::Paused;
        self.paused_at = Some(now);
        Ok(())
    }

    /// Transition `Paused` → `Active`, clearing and returning the pause
    /// timestamp.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` unless the session is
    /// paused.
    pub fn resume(&mut self) -> Result<Option<DateTime<Utc>>, SessionError> {
        if self.status != SessionStatus::Paused {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: SessionStatus::Active,
            });
        }
        self.status = SessionStatus::Active;
        Ok(self.paused_at.take())
    }

    /// Transition into the terminal `Completed` status.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from a terminal status.
    pub fn complete(&mut self) -> Result<(), SessionError> {
        self.finish(SessionStatus::Completed)
    }

    /// Transition into the terminal `Abandoned` status.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` from a terminal status.
    pub fn abandon(&mut self) -> Result<(), SessionError> {
        self.finish(SessionStatus::Abandoned)
    }

    fn finish(&mut self, terminal: SessionStatus) -> Result<(), SessionError> {
        if self.status.is_terminal() {
            return Err(SessionError::InvalidTransition {
                from: self.status,
                to: terminal,
            });
        }
        self.status = terminal;
        self.paused_at = None;
        Ok(())
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
