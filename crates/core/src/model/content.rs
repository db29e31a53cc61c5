use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::ItemId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors raised while validating reviewable content.
#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum ContentError {
    #[error("content kind cannot be empty")]
    EmptyKind,

    #[error("primary answer cannot be empty")]
    EmptyAnswer,

    #[error("difficulty must be within [0, 1], got {0}")]
    DifficultyOutOfRange(f64),
}

//
// ─── CONTENT KIND ──────────────────────────────────────────────────────────────
//

/// Validated content-type tag (trimmed, non-empty), e.g. "vocabulary" or
/// "sentence". Assigned by the content provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentKind(String);

impl ContentKind {
    /// Create a validated content kind.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::EmptyKind` if the tag is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, ContentError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ContentError::EmptyKind);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── DIFFICULTY BUCKET ─────────────────────────────────────────────────────────
//

/// Coarse difficulty band used for per-bucket statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DifficultyBucket {
    Easy,
    Medium,
    Hard,
}

impl DifficultyBucket {
    /// Maps a `[0, 1]` difficulty value to its band: `< 1/3` easy,
    /// `< 2/3` medium, otherwise hard.
    #[must_use]
    pub fn from_difficulty(difficulty: f64) -> Self {
        if difficulty < 1.0 / 3.0 {
            Self::Easy
        } else if difficulty < 2.0 / 3.0 {
            Self::Medium
        } else {
            Self::Hard
        }
    }
}

impl fmt::Display for DifficultyBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        };
        write!(f, "{label}")
    }
}

//
// ─── REVIEWABLE CONTENT ────────────────────────────────────────────────────────
//

/// One reviewable unit supplied by the content provider.
///
/// Immutable for the engine's purposes: the engine reads the prompt, checks
/// submitted answers against the accepted set, and serves hints, but never
/// mutates the content itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewableContent {
    id: ItemId,
    kind: ContentKind,
    prompt: String,
    answer: String,
    alternatives: Vec<String>,
    difficulty: f64,
    hints: Vec<String>,
}

impl ReviewableContent {
    /// Create validated content.
    ///
    /// # Errors
    ///
    /// Returns `ContentError::EmptyAnswer` if the primary answer is blank, or
    /// `ContentError::DifficultyOutOfRange` if difficulty is not a finite
    /// value in `[0, 1]`.
    pub fn new(
        id: ItemId,
        kind: ContentKind,
        prompt: impl Into<String>,
        answer: impl Into<String>,
        difficulty: f64,
    ) -> Result<Self, ContentError> {
        let answer = answer.into();
        if answer.trim().is_empty() {
            return Err(ContentError::EmptyAnswer);
        }
        if !difficulty.is_finite() || !(0.0..=1.0).contains(&difficulty) {
            return Err(ContentError::DifficultyOutOfRange(difficulty));
        }

        Ok(Self {
            id,
            kind,
            prompt: prompt.into(),
            answer,
            alternatives: Vec::new(),
            difficulty,
            hints: Vec::new(),
        })
    }

    /// Attach alternative accepted answers.
    #[must_use]
    pub fn with_alternatives(mut self, alternatives: Vec<String>) -> Self {
        self.alternatives = alternatives;
        self
    }

    /// Attach authored hint texts, ordered from vaguest to most revealing.
    #[must_use]
    pub fn with_hints(mut self, hints: Vec<String>) -> Self {
        self.hints = hints;
        self
    }

    #[must_use]
    pub fn id(&self) -> &ItemId {
        &self.id
    }

    #[must_use]
    pub fn kind(&self) -> &ContentKind {
        &self.kind
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// The primary accepted answer, shown back to the user as the expected
    /// answer.
    #[must_use]
    pub fn answer(&self) -> &str {
        &self.answer
    }

    #[must_use]
    pub fn alternatives(&self) -> &[String] {
        &self.alternatives
    }

    #[must_use]
    pub fn difficulty(&self) -> f64 {
        self.difficulty
    }

    #[must_use]
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    #[must_use]
    pub fn bucket(&self) -> DifficultyBucket {
        DifficultyBucket::from_difficulty(self.difficulty)
    }

    /// Whether `candidate` matches the primary answer or any alternative.
    ///
    /// Comparison is trimmed and case-insensitive on both sides.
    #[must_use]
    pub fn accepts(&self, candidate: &str) -> bool {
        let normalized = normalize(candidate);
        if normalized.is_empty() {
            return false;
        }
        normalize(&self.answer) == normalized
            || self
                .alternatives
                .iter()
                .any(|alt| normalize(alt) == normalized)
    }

    /// Whether `candidate` matched an alternative rather than the primary
    /// answer.
    #[must_use]
    pub fn matched_alternative(&self, candidate: &str) -> bool {
        self.accepts(candidate) && normalize(candidate) != normalize(&self.answer)
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    fn build_content() -> ReviewableContent {
        ReviewableContent::new(
            ItemId::new("vocab-1"),
            ContentKind::new("vocabulary").unwrap(),
            "to eat",
            "Taberu",
            0.4,
        )
        .unwrap()
        .with_alternatives(vec!["to eat".to_string()])
    }

    #[test]
    fn accepts_is_case_insensitive_and_trims() {
        let content = build_content();
        assert!(content.accepts("taberu"));
        assert!(content.accepts("  TABERU  "));
        assert!(content.accepts("To Eat"));
        assert!(!content.accepts("nomu"));
        assert!(!content.accepts("   "));
    }

    #[test]
    fn matched_alternative_distinguishes_primary() {
        let content = build_content();
        assert!(!content.matched_alternative("taberu"));
        assert!(content.matched_alternative("to eat"));
    }

    #[test]
    fn rejects_blank_answer() {
        let err = ReviewableContent::new(
            ItemId::new("x"),
            ContentKind::new("vocabulary").unwrap(),
            "prompt",
            "  ",
            0.5,
        )
        .unwrap_err();
        assert!(matches!(err, ContentError::EmptyAnswer));
    }

    #[test]
    fn rejects_out_of_range_difficulty() {
        for bad in [-0.1, 1.1, f64::NAN] {
            let err = ReviewableContent::new(
                ItemId::new("x"),
                ContentKind::new("vocabulary").unwrap(),
                "prompt",
                "answer",
                bad,
            )
            .unwrap_err();
            assert!(matches!(err, ContentError::DifficultyOutOfRange(_)));
        }
    }

    #[test]
    fn kind_rejects_blank_tag() {
        let err = ContentKind::new("  ").unwrap_err();
        assert!(matches!(err, ContentError::EmptyKind));
    }

    #[test]
    fn bucket_band_edges() {
        assert_eq!(DifficultyBucket::from_difficulty(0.0), DifficultyBucket::Easy);
        assert_eq!(DifficultyBucket::from_difficulty(0.4), DifficultyBucket::Medium);
        assert_eq!(DifficultyBucket::from_difficulty(0.9), DifficultyBucket::Hard);
        assert_eq!(DifficultyBucket::from_difficulty(1.0), DifficultyBucket::Hard);
    }
}
