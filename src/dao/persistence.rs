//! Scoring cache: finalized local rounds and the in-progress session, one record each per match.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    dao::{kv_store::KeyValueStore, storage::StorageError},
    scoring::{MatchId, Origin, RoundRecord, ScoringSession},
};

/// Namespace of the finalized-but-unsynced rounds record.
pub const LOCAL_ROUNDS_NAMESPACE: &str = "match_rounds";
/// Namespace of the in-progress session snapshot record.
pub const SESSION_NAMESPACE: &str = "scoring_session";

/// Build the `<namespace>_<matchId>` storage key.
pub fn storage_key(namespace: &str, match_id: MatchId) -> String {
    format!("{namespace}_{match_id}")
}

/// Failures surfaced by [`RoundCache`].
#[derive(Debug, Error)]
pub enum PersistenceError {
    /// The stored JSON could not be decoded.
    #[error("corrupt persisted data under `{key}`")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The stored session decodes but its totals disagree with its history.
    #[error("inconsistent scoring session under `{key}`")]
    Inconsistent { key: String },
    /// Encoding the value failed before reaching the store.
    #[error("failed to encode `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    /// The backing store rejected the operation.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PersistenceError {
    /// True when the stored bytes are unusable (as opposed to the store being unreachable).
    pub fn is_corrupt(&self) -> bool {
        matches!(
            self,
            PersistenceError::Corrupt { .. } | PersistenceError::Inconsistent { .. }
        )
    }
}

/// Adapter between the scoring engine and a [`KeyValueStore`].
#[derive(Clone)]
pub struct RoundCache {
    store: Arc<dyn KeyValueStore>,
}

impl RoundCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read the cached local rounds of a match. Absent data yields an empty list.
    ///
    /// Server-origin entries are never expected here and are dropped.
    pub async fn load_local_rounds(
        &self,
        match_id: MatchId,
    ) -> Result<Vec<RoundRecord>, PersistenceError> {
        let key = storage_key(LOCAL_ROUNDS_NAMESPACE, match_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(Vec::new());
        };

        let rounds: Vec<RoundRecord> = serde_json::from_str(&raw)
            .map_err(|source| PersistenceError::Corrupt { key: key.clone(), source })?;

        let total = rounds.len();
        let local: Vec<RoundRecord> = rounds
            .into_iter()
            .filter(|round| round.origin == Origin::Local)
            .collect();
        if local.len() != total {
            warn!(
                match_id,
                dropped = total - local.len(),
                "ignoring server-origin rounds found in the local cache"
            );
        }

        Ok(local)
    }

    /// Store the local-origin subset of `rounds`; clears the record when there is none.
    pub async fn save_local_rounds(
        &self,
        match_id: MatchId,
        rounds: &[RoundRecord],
    ) -> Result<(), PersistenceError> {
        let key = storage_key(LOCAL_ROUNDS_NAMESPACE, match_id);
        let local: Vec<&RoundRecord> = rounds
            .iter()
            .filter(|round| round.origin == Origin::Local)
            .collect();

        if local.is_empty() {
            self.store.remove(&key).await?;
            return Ok(());
        }

        let raw = serde_json::to_string(&local)
            .map_err(|source| PersistenceError::Encode { key: key.clone(), source })?;
        self.store.set(&key, raw).await?;
        debug!(match_id, rounds = local.len(), "local rounds persisted");
        Ok(())
    }

    /// Read the cached in-progress session of a match.
    pub async fn load_session(
        &self,
        match_id: MatchId,
    ) -> Result<Option<ScoringSession>, PersistenceError> {
        let key = storage_key(SESSION_NAMESPACE, match_id);
        let Some(raw) = self.store.get(&key).await? else {
            return Ok(None);
        };

        let session: ScoringSession = serde_json::from_str(&raw)
            .map_err(|source| PersistenceError::Corrupt { key: key.clone(), source })?;
        if !session.is_consistent() {
            return Err(PersistenceError::Inconsistent { key });
        }

        Ok(Some(session))
    }

    /// Snapshot the in-progress session.
    pub async fn save_session(
        &self,
        match_id: MatchId,
        session: &ScoringSession,
    ) -> Result<(), PersistenceError> {
        let key = storage_key(SESSION_NAMESPACE, match_id);
        let raw = serde_json::to_string(session)
            .map_err(|source| PersistenceError::Encode { key: key.clone(), source })?;
        self.store.set(&key, raw).await?;
        Ok(())
    }

    /// Drop both records of a match.
    pub async fn clear(&self, match_id: MatchId) -> Result<(), PersistenceError> {
        self.store
            .remove(&storage_key(LOCAL_ROUNDS_NAMESPACE, match_id))
            .await?;
        self.store
            .remove(&storage_key(SESSION_NAMESPACE, match_id))
            .await?;
        debug!(match_id, "scoring cache cleared");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{dao::kv_store::memory::MemoryStore, scoring::Team};

    fn record(round: u32, origin: Origin) -> RoundRecord {
        RoundRecord {
            id: i64::from(round),
            match_id: 5,
            round,
            note: "n".into(),
            half: 1,
            team1_score: 11,
            team2_score: 3,
            log: Vec::new(),
            origin,
        }
    }

    fn cache() -> (MemoryStore, RoundCache) {
        let store = MemoryStore::new();
        let cache = RoundCache::new(Arc::new(store.clone()));
        (store, cache)
    }

    #[test]
    fn keys_are_namespaced_by_match() {
        assert_eq!(storage_key(LOCAL_ROUNDS_NAMESPACE, 31), "match_rounds_31");
        assert_eq!(storage_key(SESSION_NAMESPACE, 31), "scoring_session_31");
    }

    #[tokio::test]
    async fn only_local_rounds_are_written() {
        let (store, cache) = cache();
        let rounds = vec![record(1, Origin::Server), record(2, Origin::Local)];

        cache.save_local_rounds(5, &rounds).await.unwrap();

        let raw = store.peek("match_rounds_5").unwrap();
        let stored: Vec<RoundRecord> = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, vec![record(2, Origin::Local)]);
        assert_eq!(
            cache.load_local_rounds(5).await.unwrap(),
            vec![record(2, Origin::Local)]
        );
    }

    #[tokio::test]
    async fn saving_without_local_rounds_removes_record() {
        let (store, cache) = cache();
        store.seed("match_rounds_5", "[]");

        cache
            .save_local_rounds(5, &[record(1, Origin::Server)])
            .await
            .unwrap();

        assert_eq!(store.peek("match_rounds_5"), None);
    }

    #[tokio::test]
    async fn corrupt_rounds_are_reported() {
        let (store, cache) = cache();
        store.seed("match_rounds_5", "{not json");

        let err = cache.load_local_rounds(5).await.unwrap_err();
        assert!(err.is_corrupt());
    }

    #[tokio::test]
    async fn server_rounds_in_cache_are_ignored() {
        let (store, cache) = cache();
        let raw =
            serde_json::to_string(&vec![record(1, Origin::Server), record(2, Origin::Local)])
                .unwrap();
        store.seed("match_rounds_5", raw);

        let loaded = cache.load_local_rounds(5).await.unwrap();
        assert_eq!(loaded, vec![record(2, Origin::Local)]);
    }

    #[tokio::test]
    async fn session_snapshot_round_trips() {
        let (_store, cache) = cache();
        let mut session = ScoringSession::new(2);
        session.add_point(Team::Two, 3).unwrap();
        session.set_notes("timeout called");

        cache.save_session(5, &session).await.unwrap();

        assert_eq!(cache.load_session(5).await.unwrap(), Some(session));
        assert_eq!(cache.load_session(6).await.unwrap(), None);
    }

    #[tokio::test]
    async fn inconsistent_session_is_reported() {
        let (store, cache) = cache();
        store.seed(
            "scoring_session_5",
            r#"{"round":1,"team1Score":4,"team2Score":0,"history":[],"notes":"","half":1}"#,
        );

        let err = cache.load_session(5).await.unwrap_err();
        assert!(matches!(err, PersistenceError::Inconsistent { .. }));
    }

    #[tokio::test]
    async fn clear_drops_both_records() {
        let (store, cache) = cache();
        cache
            .save_local_rounds(5, &[record(1, Origin::Local)])
            .await
            .unwrap();
        cache.save_session(5, &ScoringSession::new(2)).await.unwrap();

        cache.clear(5).await.unwrap();

        assert!(store.is_empty());
    }
}
