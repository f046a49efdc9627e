//! Error types for study-core.

use thiserror::Error;

use crate::types::CardId;

/// Result type alias using PlanError.
pub type Result<T> = std::result::Result<T, PlanError>;

/// Errors that can occur while generating a rotation schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("no topics found")]
    NoTopics,

    #[error("every topic is already completed")]
    NothingToSchedule,

    #[error("no weekday has study capacity")]
    NoCapacity,

    #[error("schedule does not fit in {days} days: {placed} placed, {remaining} left")]
    HorizonExceeded {
        days: u32,
        placed: usize,
        remaining: usize,
    },
}

/// Errors raised when advancing a study session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("session has no cards left")]
    Finished,

    #[error("card {actual} is not the current card (expected {expected})")]
    NotCurrentCard { expected: CardId, actual: CardId },
}
