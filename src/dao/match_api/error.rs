//! Error types shared by the match REST client implementations.

use thiserror::Error;

use crate::scoring::MatchId;

/// Convenient result alias returning [`MatchApiError`] failures.
pub type MatchApiResult<T> = Result<T, MatchApiError>;

/// Failures that can occur while talking to the match backend.
#[derive(Debug, Error)]
pub enum MatchApiError {
    /// No backend is configured; the service runs on local data only.
    #[error("match backend is not configured")]
    Offline,
    /// Building the HTTP client failed (invalid TLS setup, etc).
    #[cfg(feature = "http-api")]
    #[error("failed to build match backend client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent (connection refused, timeout, ...).
    #[cfg(feature = "http-api")]
    #[error("failed to send request to `{path}`")]
    RequestSend {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend answered with an unexpected status code.
    #[cfg(feature = "http-api")]
    #[error("unexpected match backend response status {status} for `{path}`")]
    RequestStatus {
        path: String,
        status: reqwest::StatusCode,
    },
    /// The response payload could not be decoded.
    #[cfg(feature = "http-api")]
    #[error("failed to decode match backend response for `{path}`")]
    DecodeResponse {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    /// The backend returned rounds belonging to another match.
    #[error("backend returned round {round} of match {got} while fetching match {expected}")]
    ForeignRound {
        expected: MatchId,
        got: MatchId,
        round: u32,
    },
}
