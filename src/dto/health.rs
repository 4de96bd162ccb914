use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Whether a match backend is configured.
    pub match_api: bool,
    /// Number of matches currently open for scoring.
    pub open_matches: usize,
}

impl HealthResponse {
    /// Create a health response indicating the system is operational.
    pub fn ok(match_api: bool, open_matches: usize) -> Self {
        Self {
            status: "ok".to_string(),
            match_api,
            open_matches,
        }
    }

    /// Create a health response indicating the scoring cache is unusable.
    pub fn degraded(match_api: bool, open_matches: usize) -> Self {
        Self {
            status: "degraded".to_string(),
            match_api,
            open_matches,
        }
    }
}
