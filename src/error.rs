use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{
    dao::match_api::error::MatchApiError,
    scoring::{MatchId, ScoringError},
    services::scorer::EndMatchError,
};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The scoring engine refused the operation.
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    /// The match backend could not complete the request.
    #[error("match backend request failed")]
    Upstream(#[source] MatchApiError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The match was never opened (or was already ended).
    #[error("match {0} is not open")]
    MatchNotOpen(MatchId),
    /// The scoring cache could not be read, so the match cannot be closed safely.
    #[error("scoring cache unavailable")]
    CacheUnavailable(#[source] EndMatchError),
}

impl From<MatchApiError> for ServiceError {
    fn from(err: MatchApiError) -> Self {
        ServiceError::Upstream(err)
    }
}

impl From<EndMatchError> for ServiceError {
    fn from(err: EndMatchError) -> Self {
        match err {
            EndMatchError::Submit(source) => ServiceError::Upstream(source),
            err @ EndMatchError::CacheUnreadable => ServiceError::CacheUnavailable(err),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Upstream backend failed.
    #[error("bad gateway: {0}")]
    BadGateway(String),
    /// A local dependency is temporarily unavailable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Scoring(ScoringError::InvalidPoints) => {
                AppError::BadRequest(ScoringError::InvalidPoints.to_string())
            }
            ServiceError::Scoring(rejection) => AppError::Conflict(rejection.to_string()),
            ServiceError::Upstream(source) => AppError::BadGateway(source.to_string()),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            err @ ServiceError::MatchNotOpen(_) => AppError::NotFound(err.to_string()),
            ServiceError::CacheUnavailable(source) => {
                AppError::ServiceUnavailable(source.to_string())
            }
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::Team;

    fn status_of(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn scoring_rejections_are_conflicts() {
        assert_eq!(
            status_of(ScoringError::RoundLimitExceeded.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ScoringError::NegativeScore { team: Team::One }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(ScoringError::InvalidPoints.into()),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn unopened_match_is_not_found() {
        assert_eq!(status_of(ServiceError::MatchNotOpen(4)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(MatchApiError::Offline.into()),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn end_match_failures_keep_their_cause() {
        assert_eq!(
            status_of(EndMatchError::Submit(MatchApiError::Offline).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(EndMatchError::CacheUnreadable.into()),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
