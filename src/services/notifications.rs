use serde::Serialize;

use crate::scoring::{MatchId, ScoringError, Team};

/// Named condition raised by the scoring facade for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum Notice {
    RoundFinalized {
        round: u32,
        team1_score: i32,
        team2_score: i32,
    },
    RoundLimitExceeded,
    NoWinnerYet,
    EmptyRound,
    UndoApplied {
        team: Team,
        points: i32,
    },
    UndoUnavailable,
    CorruptPersistedData {
        record: String,
    },
    NetworkFetchFailed {
        message: String,
    },
    PersistFailed {
        message: String,
    },
    SubmitSucceeded {
        rounds: usize,
    },
    SubmitFailed {
        message: String,
    },
}

impl Notice {
    /// Stable name of the condition, used as the SSE event name.
    pub fn kind(&self) -> &'static str {
        match self {
            Notice::RoundFinalized { .. } => "round_finalized",
            Notice::RoundLimitExceeded => "round_limit_exceeded",
            Notice::NoWinnerYet => "no_winner_yet",
            Notice::EmptyRound => "empty_round",
            Notice::UndoApplied { .. } => "undo_applied",
            Notice::UndoUnavailable => "undo_unavailable",
            Notice::CorruptPersistedData { .. } => "corrupt_persisted_data",
            Notice::NetworkFetchFailed { .. } => "network_fetch_failed",
            Notice::PersistFailed { .. } => "persist_failed",
            Notice::SubmitSucceeded { .. } => "submit_succeeded",
            Notice::SubmitFailed { .. } => "submit_failed",
        }
    }

    /// Notice matching a rejected finalize or undo, if the condition is user-facing.
    pub fn for_rejection(err: ScoringError) -> Option<Self> {
        match err {
            ScoringError::RoundLimitExceeded => Some(Notice::RoundLimitExceeded),
            ScoringError::NoWinnerYet => Some(Notice::NoWinnerYet),
            ScoringError::EmptyRound => Some(Notice::EmptyRound),
            ScoringError::UndoUnavailable => Some(Notice::UndoUnavailable),
            ScoringError::NegativeScore { .. } | ScoringError::InvalidPoints => None,
        }
    }
}

/// Notice tagged with the match it concerns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchNotice {
    pub match_id: MatchId,
    #[serde(flatten)]
    pub notice: Notice,
}

/// Sink for the conditions raised by the facade. Delivery is best-effort.
pub trait Notifier: Send + Sync {
    fn notify(&self, match_id: MatchId, notice: Notice);
}
