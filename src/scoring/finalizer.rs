use time::OffsetDateTime;
use tracing::info;

use crate::scoring::{
    error::ScoringError,
    rounds::{MAX_ROUNDS_PER_MATCH, MatchId, Origin, RoundRecord},
    session::ScoringSession,
    win_target::WinTarget,
};

/// Close the current round.
///
/// On success the new local record is appended to `rounds`, the session is
/// reset for the next round, and a copy of the record is returned. On any
/// error neither `rounds` nor `session` is modified.
pub fn finalize_round(
    match_id: MatchId,
    rounds: &mut Vec<RoundRecord>,
    session: &mut ScoringSession,
    target: &WinTarget,
) -> Result<RoundRecord, ScoringError> {
    if rounds.len() >= MAX_ROUNDS_PER_MATCH {
        return Err(ScoringError::RoundLimitExceeded);
    }
    if session.is_empty() {
        return Err(ScoringError::EmptyRound);
    }
    if session.winner(target).is_none() {
        return Err(ScoringError::NoWinnerYet);
    }

    let record = RoundRecord {
        id: local_record_id(),
        match_id,
        round: session.round(),
        note: session.notes().to_owned(),
        half: session.half(),
        team1_score: session.team1_score(),
        team2_score: session.team2_score(),
        log: session.history().to_vec(),
        origin: Origin::Local,
    };

    info!(
        match_id,
        round = record.round,
        team1 = record.team1_score,
        team2 = record.team2_score,
        "round finalized"
    );

    rounds.push(record.clone());
    session.reset();
    Ok(record)
}

/// Local records carry the creation time in milliseconds until the backend assigns an id.
fn local_record_id() -> i64 {
    let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    i64::try_from(millis).unwrap_or(i64::MAX)
}
