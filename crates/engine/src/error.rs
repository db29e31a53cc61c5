//! Shared error types for the engine crate.

use thiserror::Error;

use recall_core::model::{ConfidenceError, SessionStatus};
use recall_storage::StorageError;

/// Errors emitted by `SessionEngine`.
///
/// Every public operation either completes with its documented return value
/// or fails with one of these named variants; there is no catch-all.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    /// `start_session` was called while a session is already owned.
    #[error("a session is already active")]
    SessionAlreadyActive,

    /// An operation that needs a session found none, or the current index is
    /// already past the end.
    #[error("no active session")]
    NoActiveSession,

    /// A lifecycle operation was called from the wrong state.
    #[error("invalid session state: expected {expected}, found {actual}")]
    SessionState {
        expected: SessionStatus,
        actual: SessionStatus,
    },

    /// `start_session` was called with an empty item list.
    #[error("cannot start a session with no items")]
    EmptySession,

    /// The initial persistence call failed; the session was not started.
    #[error("failed to persist session: {0}")]
    Persistence(#[from] StorageError),

    #[error(transparent)]
    Confidence(#[from] ConfidenceError),
}
