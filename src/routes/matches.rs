use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post, put},
};
use validator::Validate;

use crate::{
    dto::scoring::{
        AbandonResponse, AddPointRequest, EndMatchResponse, FinalizeRoundResponse, HalfRequest,
        MatchSnapshot, NotesRequest, OpenMatchRequest, TeamRequest, UndoResponse,
    },
    error::AppError,
    scoring::MatchId,
    services::scoring_service,
    state::SharedState,
};

/// Scoring endpoints for a single match, keyed by its identifier.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/matches/{id}", get(get_match))
        .route("/matches/{id}/open", post(open_match))
        .route("/matches/{id}/points", post(add_point))
        .route("/matches/{id}/points/remove", post(remove_point))
        .route("/matches/{id}/undo", post(undo_last))
        .route("/matches/{id}/notes", put(set_notes))
        .route("/matches/{id}/half", put(set_half))
        .route("/matches/{id}/rounds/finalize", post(finalize_round))
        .route("/matches/{id}/refresh", post(refresh))
        .route("/matches/{id}/end", post(end_match))
        .route("/matches/{id}/local-rounds", delete(abandon_local_rounds))
}

/// Load a match for scoring: fetch server rounds, merge the local cache and resume the live round.
#[utoipa::path(
    post,
    path = "/matches/{id}/open",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    request_body = OpenMatchRequest,
    responses((status = 200, description = "Match opened", body = MatchSnapshot))
)]
pub async fn open_match(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<OpenMatchRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(
        scoring_service::open_match(&state, match_id, payload).await?,
    ))
}

/// Current scoreboard of an open match.
#[utoipa::path(
    get,
    path = "/matches/{id}",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Scoreboard", body = MatchSnapshot),
        (status = 404, description = "Match is not open")
    )
)]
pub async fn get_match(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(scoring_service::snapshot(&state, match_id).await?))
}

#[utoipa::path(
    post,
    path = "/matches/{id}/points",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    request_body = AddPointRequest,
    responses(
        (status = 200, description = "Points added", body = MatchSnapshot),
        (status = 400, description = "Unknown team or zero points")
    )
)]
pub async fn add_point(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<AddPointRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(
        scoring_service::add_point(&state, match_id, payload).await?,
    ))
}

/// Record a one-point correction against a team.
#[utoipa::path(
    post,
    path = "/matches/{id}/points/remove",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    request_body = TeamRequest,
    responses(
        (status = 200, description = "Point removed", body = MatchSnapshot),
        (status = 409, description = "Team has no point to remove")
    )
)]
pub async fn remove_point(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<TeamRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(
        scoring_service::remove_point(&state, match_id, payload).await?,
    ))
}

/// Revert the most recent point entry of the live round.
#[utoipa::path(
    post,
    path = "/matches/{id}/undo",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Entry reverted", body = UndoResponse),
        (status = 409, description = "Nothing to undo")
    )
)]
pub async fn undo_last(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<UndoResponse>, AppError> {
    Ok(Json(scoring_service::undo_last(&state, match_id).await?))
}

#[utoipa::path(
    put,
    path = "/matches/{id}/notes",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    request_body = NotesRequest,
    responses((status = 200, description = "Notes stored", body = MatchSnapshot))
)]
pub async fn set_notes(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<NotesRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(
        scoring_service::set_notes(&state, match_id, payload).await?,
    ))
}

#[utoipa::path(
    put,
    path = "/matches/{id}/half",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    request_body = HalfRequest,
    responses((status = 200, description = "Half marker stored", body = MatchSnapshot))
)]
pub async fn set_half(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
    Json(payload): Json<HalfRequest>,
) -> Result<Json<MatchSnapshot>, AppError> {
    payload.validate()?;
    Ok(Json(
        scoring_service::set_half(&state, match_id, payload).await?,
    ))
}

/// Close the live round once a team has won it.
#[utoipa::path(
    post,
    path = "/matches/{id}/rounds/finalize",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Round finalized", body = FinalizeRoundResponse),
        (status = 409, description = "Round limit reached, no winner yet, or empty round")
    )
)]
pub async fn finalize_round(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<FinalizeRoundResponse>, AppError> {
    Ok(Json(
        scoring_service::finalize_round(&state, match_id).await?,
    ))
}

/// Re-fetch server rounds after connectivity returns.
#[utoipa::path(
    post,
    path = "/matches/{id}/refresh",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    responses((status = 200, description = "Rounds re-merged", body = MatchSnapshot))
)]
pub async fn refresh(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<MatchSnapshot>, AppError> {
    Ok(Json(scoring_service::refresh(&state, match_id).await?))
}

/// Submit all rounds to the match backend and close the match.
#[utoipa::path(
    post,
    path = "/matches/{id}/end",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    responses(
        (status = 200, description = "Rounds submitted", body = EndMatchResponse),
        (status = 502, description = "Submission failed; local rounds kept"),
        (status = 503, description = "Scoring cache unreadable; nothing submitted")
    )
)]
pub async fn end_match(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<EndMatchResponse>, AppError> {
    Ok(Json(scoring_service::end_match(&state, match_id).await?))
}

/// Discard every locally recorded round and the cached live round.
#[utoipa::path(
    delete,
    path = "/matches/{id}/local-rounds",
    tag = "matches",
    params(("id" = i64, Path, description = "Match identifier")),
    responses((status = 200, description = "Local rounds dropped", body = AbandonResponse))
)]
pub async fn abandon_local_rounds(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Result<Json<AbandonResponse>, AppError> {
    Ok(Json(
        scoring_service::abandon_local_rounds(&state, match_id).await?,
    ))
}
