use serde::{Deserialize, Serialize};

use crate::scoring::{MatchId, Origin, PointEvent, RoundRecord};

fn first_half() -> u32 {
    1
}

/// Round as returned by `GET /matches/{id}/rounds`. The backend does not tag provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerRoundPayload {
    pub id: i64,
    pub match_id: MatchId,
    pub round: u32,
    #[serde(default)]
    pub note: String,
    #[serde(default = "first_half")]
    pub half: u32,
    pub team1_score: i32,
    pub team2_score: i32,
    #[serde(default)]
    pub log: Vec<PointEvent>,
}

impl From<ServerRoundPayload> for RoundRecord {
    fn from(value: ServerRoundPayload) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            round: value.round,
            note: value.note,
            half: value.half,
            team1_score: value.team1_score,
            team2_score: value.team2_score,
            log: value.log,
            origin: Origin::Server,
        }
    }
}

/// Round as submitted in the `POST /matches/{id}/rounds` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRoundPayload {
    pub round: u32,
    pub note: String,
    pub half: u32,
    pub team1_score: i32,
    pub team2_score: i32,
    pub log: Vec<PointEvent>,
}

impl From<&RoundRecord> for SubmitRoundPayload {
    fn from(value: &RoundRecord) -> Self {
        Self {
            round: value.round,
            note: value.note.clone(),
            half: value.half,
            team1_score: value.team1_score,
            team2_score: value.team2_score,
            log: value.log.clone(),
        }
    }
}

/// Body of the submission request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRoundsRequest {
    pub match_id: MatchId,
    pub rounds: Vec<SubmitRoundPayload>,
}
