//! Error types for the scheduling engine and its storage boundary.
//!
//! The engine itself only ever fails on caller contract violations. Missing
//! cards and decks are reported by the `Store`, and `SessionError` carries
//! either kind up to the caller without string matching.

use thiserror::Error;

use crate::model::{CardId, DeckId};

/// Errors raised by the pure scheduling functions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// An answer quality outside 0..=5 was supplied.
    #[error("invalid answer quality {0}, expected 0-5")]
    InvalidQuality(u8),
}

/// Errors raised when validating a resolved deck policy.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    /// A learning step of zero minutes would make a card due immediately forever.
    #[error("learning step {index} is zero minutes")]
    ZeroLearningStep { index: usize },

    /// Graduation must push the card at least one day out.
    #[error("graduating interval must be at least 1 day")]
    ZeroGraduatingInterval,

    /// Intervals are capped; a longer graduation would be silently shortened.
    #[error("graduating interval of {days} days exceeds the maximum of {max}")]
    GraduatingIntervalTooLong { days: u32, max: u32 },
}

/// Errors raised by a `Store` implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No card with this id exists.
    #[error("unknown card: {0}")]
    UnknownCard(CardId),

    /// No deck with this id exists.
    #[error("unknown deck: {0}")]
    UnknownDeck(DeckId),

    /// A deck with this name already exists.
    #[error("deck already exists: {0}")]
    DuplicateDeck(String),

    /// The backing file could not be read or written.
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file contents could not be (de)serialized.
    #[error("storage serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns `true` if the error means the referenced entity does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::UnknownCard(_) | StoreError::UnknownDeck(_))
    }
}

/// Errors surfaced by a `StudySession`.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    #[error(transparent)]
    Policy(#[from] PolicyError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
