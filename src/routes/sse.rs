use std::convert::Infallible;

use axum::{
    Router,
    extract::{Path, State},
    response::sse::Sse,
    routing::get,
};
use futures::Stream;
use tracing::info;

use crate::{scoring::MatchId, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/matches/{id}/events",
    tag = "sse",
    params(("id" = i64, Path, description = "Match identifier")),
    responses((status = 200, description = "Notice stream of the match", content_type = "text/event-stream", body = String))
)]
/// Stream the notices raised while scoring a match. Subscribing before the
/// match is opened also delivers the notices raised while loading it.
pub async fn match_events(
    State(state): State<SharedState>,
    Path(match_id): Path<MatchId>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_notices(&state);
    info!(match_id, "new notice stream connection");
    sse_service::to_sse_stream(receiver, match_id)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/matches/{id}/events", get(match_events))
}
