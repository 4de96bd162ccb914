use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI document for the match scoring service.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::matches::open_match,
        crate::routes::matches::get_match,
        crate::routes::matches::add_point,
        crate::routes::matches::remove_point,
        crate::routes::matches::undo_last,
        crate::routes::matches::set_notes,
        crate::routes::matches::set_half,
        crate::routes::matches::finalize_round,
        crate::routes::matches::refresh,
        crate::routes::matches::end_match,
        crate::routes::matches::abandon_local_rounds,
        crate::routes::sse::match_events,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::scoring::OpenMatchRequest,
            crate::dto::scoring::AddPointRequest,
            crate::dto::scoring::TeamRequest,
            crate::dto::scoring::NotesRequest,
            crate::dto::scoring::HalfRequest,
            crate::dto::scoring::MatchSnapshot,
            crate::dto::scoring::FinalizeRoundResponse,
            crate::dto::scoring::UndoResponse,
            crate::dto::scoring::AbandonResponse,
            crate::dto::scoring::EndMatchResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "matches", description = "Match scoring operations"),
        (name = "sse", description = "Server-sent notice streams"),
    )
)]
pub struct ApiDoc;
