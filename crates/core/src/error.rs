use thiserror::Error;

use crate::model::{ContentError, ConfidenceError, IdError, SessionError, StatisticsError};

/// Crate-level error aggregate for callers that do not care which model
/// layer rejected their input.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Content(#[from] ContentError),
    #[error(transparent)]
    Confidence(#[from] ConfidenceError),
    #[error(transparent)]
    Id(#[from] IdError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Statistics(#[from] StatisticsError),
}
