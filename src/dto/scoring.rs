//! DTO definitions used by the match scoring REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::format_timestamp,
    scoring::{DataOrigin, MatchId, Origin, PointEvent, RoundRecord, ScoringSession, Team},
    services::scorer::ScoreboardSnapshot,
};

/// Request opening (or re-opening) a match for scoring.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OpenMatchRequest {
    /// Raw win-score code: 1 plays to 11, 2 to 15, 3 to 21. Anything else plays to 11.
    #[serde(default)]
    pub win_score: Option<i32>,
}

/// Request awarding points to a team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct AddPointRequest {
    /// Team number, 1 or 2.
    #[validate(range(min = 1, max = 2))]
    pub team: u8,
    /// Points to add; one when omitted.
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub points: Option<u32>,
}

/// Request targeting a single team.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct TeamRequest {
    #[validate(range(min = 1, max = 2))]
    pub team: u8,
}

/// Free-form notes attached to the round being scored.
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotesRequest {
    pub notes: String,
}

/// Half marker of the round being scored.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct HalfRequest {
    #[validate(range(min = 1))]
    pub half: u32,
}

/// One entry of a point log.
#[derive(Debug, Serialize, ToSchema)]
pub struct PointEventSummary {
    pub team: u8,
    pub points: i32,
    /// RFC 3339 timestamp.
    pub timestamp: String,
}

impl From<&PointEvent> for PointEventSummary {
    fn from(event: &PointEvent) -> Self {
        Self {
            team: event.team.number(),
            points: event.points,
            timestamp: format_timestamp(event.timestamp),
        }
    }
}

/// Finalized round as exposed to clients.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoundSummary {
    pub id: i64,
    pub round: u32,
    pub note: String,
    pub half: u32,
    pub team1_score: i32,
    pub team2_score: i32,
    pub winner: Option<u8>,
    /// `server` or `local`.
    #[schema(value_type = String)]
    pub origin: Origin,
    pub log: Vec<PointEventSummary>,
}

impl From<&RoundRecord> for RoundSummary {
    fn from(record: &RoundRecord) -> Self {
        Self {
            id: record.id,
            round: record.round,
            note: record.note.clone(),
            half: record.half,
            team1_score: record.team1_score,
            team2_score: record.team2_score,
            winner: record.winner().map(Team::number),
            origin: record.origin,
            log: record.log.iter().map(PointEventSummary::from).collect(),
        }
    }
}

/// Live state of the round being scored.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub round: u32,
    pub team1_score: i32,
    pub team2_score: i32,
    pub notes: String,
    pub half: u32,
    pub can_undo: bool,
    pub history: Vec<PointEventSummary>,
}

impl From<&ScoringSession> for SessionSummary {
    fn from(session: &ScoringSession) -> Self {
        Self {
            round: session.round(),
            team1_score: session.team1_score(),
            team2_score: session.team2_score(),
            notes: session.notes().to_owned(),
            half: session.half(),
            can_undo: !session.history().is_empty(),
            history: session
                .history()
                .iter()
                .map(PointEventSummary::from)
                .collect(),
        }
    }
}

/// Win thresholds of the match.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WinTargetSummary {
    pub win_score_code: i32,
    pub target_score: i32,
    pub overtime_limit: i32,
}

/// Full scoreboard of an open match.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchSnapshot {
    pub match_id: MatchId,
    pub target: WinTargetSummary,
    pub rounds: Vec<RoundSummary>,
    pub session: SessionSummary,
    pub game_point: Option<u8>,
    pub winner: Option<u8>,
    /// `server`, `local` or `new`.
    #[schema(value_type = String)]
    pub data_origin: DataOrigin,
    pub round_limit_reached: bool,
    /// False while the last cache write has not been persisted.
    pub cache_in_sync: bool,
}

impl From<ScoreboardSnapshot> for MatchSnapshot {
    fn from(snapshot: ScoreboardSnapshot) -> Self {
        Self {
            match_id: snapshot.match_id,
            target: WinTargetSummary {
                win_score_code: snapshot.setting.code(),
                target_score: snapshot.target.target_score,
                overtime_limit: snapshot.target.overtime_limit,
            },
            rounds: snapshot.rounds.iter().map(RoundSummary::from).collect(),
            session: SessionSummary::from(&snapshot.session),
            game_point: snapshot.game_point.map(Team::number),
            winner: snapshot.winner.map(Team::number),
            data_origin: snapshot.data_origin,
            round_limit_reached: snapshot.round_limit_reached,
            cache_in_sync: snapshot.cache_in_sync,
        }
    }
}

/// Response to a successful finalize.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinalizeRoundResponse {
    pub finalized: RoundSummary,
    pub snapshot: MatchSnapshot,
}

/// Response to a successful undo.
#[derive(Debug, Serialize, ToSchema)]
pub struct UndoResponse {
    pub undone: PointEventSummary,
    pub snapshot: MatchSnapshot,
}

/// Response to abandoning the local rounds of a match.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AbandonResponse {
    pub dropped_rounds: usize,
    pub snapshot: MatchSnapshot,
}

/// Response to a successful end of match.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EndMatchResponse {
    pub match_id: MatchId,
    pub submitted_rounds: usize,
}
