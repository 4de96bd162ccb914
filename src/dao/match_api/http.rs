use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, Method, StatusCode};
use tracing::debug;

use crate::scoring::{MatchId, RoundRecord};

use super::{
    MatchApi,
    error::{MatchApiError, MatchApiResult},
    models::{ServerRoundPayload, SubmitRoundPayload, SubmitRoundsRequest},
};

/// [`MatchApi`] implementation talking JSON over HTTP to the match backend.
#[derive(Clone)]
pub struct HttpMatchApi {
    client: Client,
    base_url: Arc<str>,
}

impl HttpMatchApi {
    /// Build a client for `base_url`; every request is bounded by `timeout`.
    pub fn new(base_url: &str, timeout: Duration) -> MatchApiResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| MatchApiError::ClientBuilder { source })?;

        Ok(Self {
            client,
            base_url: Arc::<str>::from(base_url.trim_end_matches('/')),
        })
    }

    fn rounds_path(match_id: MatchId) -> String {
        format!("matches/{match_id}/rounds")
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, format!("{}/{}", self.base_url, path))
    }

    async fn get_rounds(&self, match_id: MatchId) -> MatchApiResult<Vec<RoundRecord>> {
        let path = Self::rounds_path(match_id);
        let response = self
            .request(Method::GET, &path)
            .send()
            .await
            .map_err(|source| MatchApiError::RequestSend {
                path: path.clone(),
                source,
            })?;

        let payload = match response.status() {
            // No rounds recorded yet for this match.
            StatusCode::NOT_FOUND => Vec::new(),
            status if status.is_success() => response
                .json::<Vec<ServerRoundPayload>>()
                .await
                .map_err(|source| MatchApiError::DecodeResponse {
                    path: path.clone(),
                    source,
                })?,
            other => {
                return Err(MatchApiError::RequestStatus {
                    path,
                    status: other,
                });
            }
        };

        if let Some(foreign) = payload.iter().find(|round| round.match_id != match_id) {
            return Err(MatchApiError::ForeignRound {
                expected: match_id,
                got: foreign.match_id,
                round: foreign.round,
            });
        }

        debug!(match_id, rounds = payload.len(), "fetched server rounds");
        Ok(payload.into_iter().map(Into::into).collect())
    }

    async fn post_rounds(&self, match_id: MatchId, rounds: Vec<RoundRecord>) -> MatchApiResult<()> {
        let path = Self::rounds_path(match_id);
        let body = SubmitRoundsRequest {
            match_id,
            rounds: rounds.iter().map(SubmitRoundPayload::from).collect(),
        };

        let response = self
            .request(Method::POST, &path)
            .json(&body)
            .send()
            .await
            .map_err(|source| MatchApiError::RequestSend {
                path: path.clone(),
                source,
            })?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(MatchApiError::RequestStatus {
                path,
                status: response.status(),
            })
        }
    }
}

impl MatchApi for HttpMatchApi {
    fn fetch_match_rounds(
        &self,
        match_id: MatchId,
    ) -> BoxFuture<'static, MatchApiResult<Vec<RoundRecord>>> {
        let api = self.clone();
        Box::pin(async move { api.get_rounds(match_id).await })
    }

    fn submit_match_rounds(
        &self,
        match_id: MatchId,
        rounds: Vec<RoundRecord>,
    ) -> BoxFuture<'static, MatchApiResult<()>> {
        let api = self.clone();
        Box::pin(async move { api.post_rounds(match_id, rounds).await })
    }
}
