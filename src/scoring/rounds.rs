use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

/// Identifier of a match as issued by the REST backend.
pub type MatchId = i64;

/// Hard cap on the number of rounds a single match can hold.
pub const MAX_ROUNDS_PER_MATCH: usize = 3;

/// One of the two sides of a match. Serialized as the integer `1` or `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Team {
    /// First team (home side).
    One,
    /// Second team (away side).
    Two,
}

/// Raised when a raw team number is neither `1` nor `2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("team must be 1 or 2 (got {0})")]
pub struct InvalidTeam(pub u8);

impl Team {
    /// Both teams, in scoreboard order.
    pub const ALL: [Team; 2] = [Team::One, Team::Two];

    /// The opposing team.
    pub fn other(self) -> Self {
        match self {
            Team::One => Team::Two,
            Team::Two => Team::One,
        }
    }

    /// Scoreboard number of the team (`1` or `2`).
    pub fn number(self) -> u8 {
        match self {
            Team::One => 1,
            Team::Two => 2,
        }
    }
}

impl TryFrom<u8> for Team {
    type Error = InvalidTeam;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Team::One),
            2 => Ok(Team::Two),
            other => Err(InvalidTeam(other)),
        }
    }
}

impl From<Team> for u8 {
    fn from(team: Team) -> Self {
        team.number()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team {}", self.number())
    }
}

/// A single scoring action. Immutable once recorded; the unit of undo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PointEvent {
    /// Team credited (or debited) by the event.
    pub team: Team,
    /// Signed point delta; negative only for explicit decrements.
    pub points: i32,
    /// Moment the scorer pressed the button.
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
}

/// Provenance of a round record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Authoritative round returned by the REST backend.
    Server,
    /// Round finalized on this device and not yet confirmed by the backend.
    Local,
}

/// Immutable record of a completed round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundRecord {
    /// Backend identifier, or a millisecond timestamp for local records.
    pub id: i64,
    /// Match the round belongs to.
    pub match_id: MatchId,
    /// Round number, starting at 1.
    pub round: u32,
    /// Free-form scorer note.
    pub note: String,
    /// Half/phase marker active when the round ended.
    pub half: u32,
    /// Final score of team 1.
    pub team1_score: i32,
    /// Final score of team 2.
    pub team2_score: i32,
    /// Ordered point events that produced the score.
    pub log: Vec<PointEvent>,
    /// Whether the record comes from the backend or from the local cache.
    pub origin: Origin,
}

impl RoundRecord {
    /// Final score of `team` in this round.
    pub fn score(&self, team: Team) -> i32 {
        match team {
            Team::One => self.team1_score,
            Team::Two => self.team2_score,
        }
    }

    /// Team with the higher final score, if any.
    pub fn winner(&self) -> Option<Team> {
        match self.team1_score.cmp(&self.team2_score) {
            std::cmp::Ordering::Greater => Some(Team::One),
            std::cmp::Ordering::Less => Some(Team::Two),
            std::cmp::Ordering::Equal => None,
        }
    }

    /// True for records the backend already holds.
    pub fn is_authoritative(&self) -> bool {
        self.origin == Origin::Server
    }
}
