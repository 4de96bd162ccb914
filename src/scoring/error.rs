use thiserror::Error;

use crate::scoring::rounds::{MAX_ROUNDS_PER_MATCH, Team};

/// Validation conditions raised by the scoring engine.
///
/// Every variant is recoverable: the operation that raised it left the
/// session and the round list untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ScoringError {
    /// The match already holds the maximum number of rounds.
    #[error("round limit reached: a match allows at most {MAX_ROUNDS_PER_MATCH} rounds")]
    RoundLimitExceeded,
    /// Finalize was requested before either team met a win condition.
    #[error("no winner yet")]
    NoWinnerYet,
    /// Finalize was requested for a round without any scoring.
    #[error("empty round: no points have been scored")]
    EmptyRound,
    /// Undo was requested with an empty point history.
    #[error("nothing to undo")]
    UndoUnavailable,
    /// A decrement would push the team's score below zero.
    #[error("{team} score cannot go below zero")]
    NegativeScore {
        /// Team whose score would underflow.
        team: Team,
    },
    /// Increment with a zero or out-of-range point value.
    #[error("points must be a positive value")]
    InvalidPoints,
}
