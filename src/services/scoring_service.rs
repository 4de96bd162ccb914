//! Business logic powering the match routes. Every operation resolves the
//! open match from the registry and runs under that match's lock, so two
//! requests never interleave on the same scoreboard.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    dto::scoring::{
        AbandonResponse, AddPointRequest, EndMatchResponse, FinalizeRoundResponse, HalfRequest,
        MatchSnapshot, NotesRequest, OpenMatchRequest, PointEventSummary, RoundSummary,
        TeamRequest, UndoResponse,
    },
    error::ServiceError,
    scoring::{MatchId, Team, WinScoreSetting},
    services::scorer::MatchScorer,
    state::{ScorerHandle, SharedState},
};

fn require_scorer(state: &SharedState, match_id: MatchId) -> Result<ScorerHandle, ServiceError> {
    state
        .scorer(match_id)
        .ok_or(ServiceError::MatchNotOpen(match_id))
}

fn parse_team(raw: u8) -> Result<Team, ServiceError> {
    Team::try_from(raw).map_err(|err| ServiceError::InvalidInput(err.to_string()))
}

/// Open a match, loading its rounds; an already open match is returned as is.
pub async fn open_match(
    state: &SharedState,
    match_id: MatchId,
    request: OpenMatchRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let setting = WinScoreSetting::from_code(request.win_score);
    let _gate = state.open_gate().lock().await;

    if let Some(existing) = state.scorer(match_id) {
        let scorer = existing.lock().await;
        // end_match may have closed the match while we waited for its lock.
        let still_open = state
            .scorer(match_id)
            .is_some_and(|current| Arc::ptr_eq(&current, &existing));
        if !still_open {
            debug!(match_id, "match closed while reopening; loading it again");
            drop(scorer);
            return open_fresh(state, match_id, setting).await;
        }
        if scorer.setting() != setting {
            debug!(
                match_id,
                requested = ?setting,
                current = ?scorer.setting(),
                "match already open; keeping its win target"
            );
        }
        return Ok(scorer.snapshot().into());
    }

    open_fresh(state, match_id, setting).await
}

/// Load a match and register it. Callers hold the open gate.
async fn open_fresh(
    state: &SharedState,
    match_id: MatchId,
    setting: WinScoreSetting,
) -> Result<MatchSnapshot, ServiceError> {
    let scorer = MatchScorer::open(match_id, setting, state.collaborators()).await;
    let snapshot = scorer.snapshot().into();
    state
        .matches()
        .insert(match_id, Arc::new(Mutex::new(scorer)));
    Ok(snapshot)
}

pub async fn snapshot(state: &SharedState, match_id: MatchId) -> Result<MatchSnapshot, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let scorer = handle.lock().await;
    Ok(scorer.snapshot().into())
}

pub async fn add_point(
    state: &SharedState,
    match_id: MatchId,
    request: AddPointRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let team = parse_team(request.team)?;
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    scorer.add_point(team, request.points.unwrap_or(1)).await?;
    Ok(scorer.snapshot().into())
}

pub async fn remove_point(
    state: &SharedState,
    match_id: MatchId,
    request: TeamRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let team = parse_team(request.team)?;
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    scorer.remove_point(team).await?;
    Ok(scorer.snapshot().into())
}

pub async fn undo_last(state: &SharedState, match_id: MatchId) -> Result<UndoResponse, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    let undone = scorer.undo_last().await?;
    Ok(UndoResponse {
        undone: PointEventSummary::from(&undone),
        snapshot: scorer.snapshot().into(),
    })
}

pub async fn set_notes(
    state: &SharedState,
    match_id: MatchId,
    request: NotesRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    scorer.set_notes(request.notes).await;
    Ok(scorer.snapshot().into())
}

pub async fn set_half(
    state: &SharedState,
    match_id: MatchId,
    request: HalfRequest,
) -> Result<MatchSnapshot, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    scorer.set_half(request.half).await;
    Ok(scorer.snapshot().into())
}

pub async fn finalize_round(
    state: &SharedState,
    match_id: MatchId,
) -> Result<FinalizeRoundResponse, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    let record = scorer.finalize_round().await?;
    Ok(FinalizeRoundResponse {
        finalized: RoundSummary::from(&record),
        snapshot: scorer.snapshot().into(),
    })
}

/// Re-fetch server rounds; a backend failure is reported through the notice stream only.
pub async fn refresh(state: &SharedState, match_id: MatchId) -> Result<MatchSnapshot, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    scorer.refresh().await;
    Ok(scorer.snapshot().into())
}

/// Submit every round, then close the match.
pub async fn end_match(
    state: &SharedState,
    match_id: MatchId,
) -> Result<EndMatchResponse, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    let submitted_rounds = scorer.end_match().await?;
    state.matches().remove(&match_id);
    info!(match_id, submitted_rounds, "match closed");
    Ok(EndMatchResponse {
        match_id,
        submitted_rounds,
    })
}

pub async fn abandon_local_rounds(
    state: &SharedState,
    match_id: MatchId,
) -> Result<AbandonResponse, ServiceError> {
    let handle = require_scorer(state, match_id)?;
    let mut scorer = handle.lock().await;
    let dropped_rounds = scorer.abandon_local_rounds().await;
    Ok(AbandonResponse {
        dropped_rounds,
        snapshot: scorer.snapshot().into(),
    })
}
