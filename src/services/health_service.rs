use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Report whether the scoring cache is usable, logging storage issues.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let match_api = state.config().match_api_base_url.is_some();
    let open_matches = state.matches().len();

    match state.store().health_check().await {
        Ok(()) => HealthResponse::ok(match_api, open_matches),
        Err(err) => {
            warn!(error = %err, "scoring cache health check failed");
            HealthResponse::degraded(match_api, open_matches)
        }
    }
}
