//! REST collaborator that owns the authoritative round records.

pub mod error;
#[cfg(feature = "http-api")]
pub mod http;
pub mod models;

use futures::future::BoxFuture;

use crate::scoring::{MatchId, RoundRecord};

use self::error::{MatchApiError, MatchApiResult};

/// Abstraction over the backend holding the authoritative round records.
pub trait MatchApi: Send + Sync {
    /// Fetch the rounds the backend already recorded; every entry has server origin.
    fn fetch_match_rounds(
        &self,
        match_id: MatchId,
    ) -> BoxFuture<'static, MatchApiResult<Vec<RoundRecord>>>;
    /// Submit the final round list of a match.
    fn submit_match_rounds(
        &self,
        match_id: MatchId,
        rounds: Vec<RoundRecord>,
    ) -> BoxFuture<'static, MatchApiResult<()>>;
}

/// Stand-in used when no backend is configured: every call fails with [`MatchApiError::Offline`].
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineMatchApi;

impl MatchApi for OfflineMatchApi {
    fn fetch_match_rounds(
        &self,
        _match_id: MatchId,
    ) -> BoxFuture<'static, MatchApiResult<Vec<RoundRecord>>> {
        Box::pin(async { Err(MatchApiError::Offline) })
    }

    fn submit_match_rounds(
        &self,
        _match_id: MatchId,
        _rounds: Vec<RoundRecord>,
    ) -> BoxFuture<'static, MatchApiResult<()>> {
        Box::pin(async { Err(MatchApiError::Offline) })
    }
}
