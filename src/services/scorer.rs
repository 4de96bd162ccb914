//! Facade owning one match: loads and merges rounds on open, drives the live
//! session, persists the scoring cache after every change, and cleans the
//! cache up once the backend holds the final rounds.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
    dao::{
        kv_store::KeyValueStore,
        match_api::{MatchApi, error::MatchApiError},
        persistence::{
            LOCAL_ROUNDS_NAMESPACE, PersistenceError, RoundCache, SESSION_NAMESPACE, storage_key,
        },
    },
    scoring::{
        DataOrigin, MAX_ROUNDS_PER_MATCH, MatchId, Origin, PointEvent, RoundRecord, ScoringError,
        ScoringSession, Team, WinScoreSetting, WinTarget, finalize_round, merge_rounds,
    },
    services::notifications::{Notice, Notifier},
};

/// External collaborators a [`MatchScorer`] talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub api: Arc<dyn MatchApi>,
    pub store: Arc<dyn KeyValueStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Why a match could not be ended.
#[derive(Debug, Error)]
pub enum EndMatchError {
    /// A cache record could not be read; it may hold rounds never submitted.
    #[error("scoring cache unreadable; rounds it may hold were never submitted")]
    CacheUnreadable,
    /// The backend rejected or never received the rounds.
    #[error(transparent)]
    Submit(#[from] MatchApiError),
}

/// Point-in-time read model of a match.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreboardSnapshot {
    pub match_id: MatchId,
    pub setting: WinScoreSetting,
    pub target: WinTarget,
    pub rounds: Vec<RoundRecord>,
    pub session: ScoringSession,
    pub game_point: Option<Team>,
    pub winner: Option<Team>,
    pub data_origin: DataOrigin,
    pub round_limit_reached: bool,
    pub cache_in_sync: bool,
}

/// Scoring state of a single open match.
pub struct MatchScorer {
    match_id: MatchId,
    setting: WinScoreSetting,
    target: WinTarget,
    rounds: Vec<RoundRecord>,
    session: ScoringSession,
    data_origin: DataOrigin,
    cache: RoundCache,
    api: Arc<dyn MatchApi>,
    notifier: Arc<dyn Notifier>,
    cache_in_sync: bool,
    unread: UnreadRecords,
}

/// Cache records whose read failed for a reason other than bad data.
/// They are never overwritten until a re-read succeeds.
#[derive(Debug, Default, Clone, Copy)]
struct UnreadRecords {
    local_rounds: bool,
    session: bool,
}

impl UnreadRecords {
    fn any(self) -> bool {
        self.local_rounds || self.session
    }
}

impl MatchScorer {
    /// Load a match: fetch server rounds and read the cache, then merge.
    ///
    /// Both sources are awaited before merging. A fetch failure or corrupt
    /// cache data degrades to absent data and is reported through the
    /// notifier. A cache record that cannot be read at all is re-read before
    /// anything is written over it.
    pub async fn open(
        match_id: MatchId,
        setting: WinScoreSetting,
        collaborators: &Collaborators,
    ) -> Self {
        let cache = RoundCache::new(Arc::clone(&collaborators.store));
        let api = Arc::clone(&collaborators.api);
        let notifier = Arc::clone(&collaborators.notifier);

        let (fetched, cached_rounds, cached_session) = tokio::join!(
            api.fetch_match_rounds(match_id),
            cache.load_local_rounds(match_id),
            cache.load_session(match_id),
        );

        let (server_rounds, fetch_failed) = match fetched {
            Ok(rounds) => (rounds, false),
            Err(err) => {
                warn!(match_id, error = %err, "server rounds unavailable; using local data only");
                notifier.notify(
                    match_id,
                    Notice::NetworkFetchFailed {
                        message: err.to_string(),
                    },
                );
                (Vec::new(), true)
            }
        };

        let mut unread = UnreadRecords::default();
        let local_rounds = cached_rounds.unwrap_or_else(|err| {
            unread.local_rounds =
                report_cache_read(notifier.as_ref(), match_id, LOCAL_ROUNDS_NAMESPACE, &err);
            Vec::new()
        });
        let stored_session = cached_session.unwrap_or_else(|err| {
            unread.session =
                report_cache_read(notifier.as_ref(), match_id, SESSION_NAMESPACE, &err);
            None
        });

        let merged = merge_rounds(&server_rounds, &local_rounds);
        let data_origin = if fetch_failed {
            DataOrigin::Local
        } else {
            merged.data_origin
        };
        let session = resume_session(match_id, &merged.rounds, stored_session);

        info!(
            match_id,
            server = server_rounds.len(),
            local = local_rounds.len(),
            rounds = merged.rounds.len(),
            origin = ?data_origin,
            next_round = session.round(),
            "match opened"
        );

        Self {
            match_id,
            setting,
            target: WinTarget::resolve(setting),
            rounds: merged.rounds,
            session,
            data_origin,
            cache,
            api,
            notifier,
            cache_in_sync: true,
            unread,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn setting(&self) -> WinScoreSetting {
        self.setting
    }

    pub fn target(&self) -> WinTarget {
        self.target
    }

    /// Working round list, ordered by round number.
    pub fn rounds(&self) -> &[RoundRecord] {
        &self.rounds
    }

    /// Live session of the round being scored.
    pub fn session(&self) -> &ScoringSession {
        &self.session
    }

    pub fn data_origin(&self) -> DataOrigin {
        self.data_origin
    }

    pub fn game_point(&self) -> Option<Team> {
        self.session.game_point(&self.target)
    }

    pub fn winner(&self) -> Option<Team> {
        self.session.winner(&self.target)
    }

    pub fn round_limit_reached(&self) -> bool {
        self.rounds.len() >= MAX_ROUNDS_PER_MATCH
    }

    /// False while the last cache write failed and has not been retried successfully.
    pub fn cache_in_sync(&self) -> bool {
        self.cache_in_sync
    }

    pub fn snapshot(&self) -> ScoreboardSnapshot {
        ScoreboardSnapshot {
            match_id: self.match_id,
            setting: self.setting,
            target: self.target,
            rounds: self.rounds.clone(),
            session: self.session.clone(),
            game_point: self.game_point(),
            winner: self.winner(),
            data_origin: self.data_origin,
            round_limit_reached: self.round_limit_reached(),
            cache_in_sync: self.cache_in_sync,
        }
    }

    pub async fn add_point(&mut self, team: Team, points: u32) -> Result<(), ScoringError> {
        self.recover_unread_records().await;
        self.session.add_point(team, points)?;
        self.persist_session().await;
        Ok(())
    }

    pub async fn remove_point(&mut self, team: Team) -> Result<(), ScoringError> {
        self.recover_unread_records().await;
        self.session.remove_point(team)?;
        self.persist_session().await;
        Ok(())
    }

    pub async fn undo_last(&mut self) -> Result<PointEvent, ScoringError> {
        self.recover_unread_records().await;
        match self.session.undo_last() {
            Ok(event) => {
                self.notify(Notice::UndoApplied {
                    team: event.team,
                    points: event.points,
                });
                self.persist_session().await;
                Ok(event)
            }
            Err(err) => {
                self.reject(err);
                Err(err)
            }
        }
    }

    pub async fn set_notes(&mut self, notes: String) {
        self.recover_unread_records().await;
        self.session.set_notes(notes);
        self.persist_session().await;
    }

    pub async fn set_half(&mut self, half: u32) {
        self.recover_unread_records().await;
        self.session.set_half(half);
        self.persist_session().await;
    }

    /// Close the current round and start the next one.
    pub async fn finalize_round(&mut self) -> Result<RoundRecord, ScoringError> {
        self.recover_unread_records().await;
        match finalize_round(
            self.match_id,
            &mut self.rounds,
            &mut self.session,
            &self.target,
        ) {
            Ok(record) => {
                if self.data_origin == DataOrigin::New {
                    self.data_origin = DataOrigin::Local;
                }
                self.notify(Notice::RoundFinalized {
                    round: record.round,
                    team1_score: record.team1_score,
                    team2_score: record.team2_score,
                });
                self.persist_all().await;
                Ok(record)
            }
            Err(err) => {
                self.reject(err);
                Err(err)
            }
        }
    }

    /// Re-fetch server rounds and merge them with the local rounds held in memory.
    pub async fn refresh(&mut self) -> DataOrigin {
        self.recover_unread_records().await;
        if self.reload_server_rounds().await {
            self.persist_all().await;
        }
        self.data_origin
    }

    /// Submit every round to the backend, then drop the cache.
    ///
    /// Refused while a cache record is unreadable, since clearing it would
    /// lose rounds that were never submitted. On failure nothing is cleaned
    /// up so unsynchronized rounds survive.
    pub async fn end_match(&mut self) -> Result<usize, EndMatchError> {
        if !self.recover_unread_records().await {
            warn!(match_id = self.match_id, "scoring cache unreadable; refusing to end match");
            self.notify(Notice::SubmitFailed {
                message: EndMatchError::CacheUnreadable.to_string(),
            });
            return Err(EndMatchError::CacheUnreadable);
        }

        let submitted = self.rounds.len();
        if !self.session.is_empty() {
            warn!(
                match_id = self.match_id,
                round = self.session.round(),
                "ending match with an unfinished round; its points are discarded"
            );
        }

        if let Err(err) = self
            .api
            .submit_match_rounds(self.match_id, self.rounds.clone())
            .await
        {
            warn!(match_id = self.match_id, error = %err, "round submission failed; keeping local cache");
            self.notify(Notice::SubmitFailed {
                message: err.to_string(),
            });
            return Err(err.into());
        }

        info!(match_id = self.match_id, rounds = submitted, "rounds submitted");
        match self.cache.clear(self.match_id).await {
            Ok(()) => self.cache_in_sync = true,
            Err(err) => self.record_write(Err(err)),
        }
        self.notify(Notice::SubmitSucceeded { rounds: submitted });

        // The backend now owns every round; pick up its records without re-caching.
        self.reload_server_rounds().await;
        Ok(submitted)
    }

    /// Drop every local round and the cached session, keeping server rounds only.
    pub async fn abandon_local_rounds(&mut self) -> usize {
        let before = self.rounds.len();
        self.rounds.retain(RoundRecord::is_authoritative);
        let dropped = before - self.rounds.len();

        let mut session = ScoringSession::new(next_round_number(&self.rounds));
        session.set_half(self.session.half());
        self.session = session;
        self.data_origin = if self.rounds.is_empty() {
            DataOrigin::New
        } else {
            DataOrigin::Server
        };

        info!(
            match_id = self.match_id,
            dropped, "local rounds abandoned"
        );
        let result = self.cache.clear(self.match_id).await;
        if result.is_ok() {
            // The discarded records no longer need to be read back.
            self.unread = UnreadRecords::default();
        }
        self.record_write(result);
        dropped
    }

    /// Fetch and merge; returns false (and reports) when the backend is unreachable.
    async fn reload_server_rounds(&mut self) -> bool {
        let server_rounds = match self.api.fetch_match_rounds(self.match_id).await {
            Ok(rounds) => rounds,
            Err(err) => {
                warn!(match_id = self.match_id, error = %err, "refresh failed; keeping current rounds");
                self.notify(Notice::NetworkFetchFailed {
                    message: err.to_string(),
                });
                return false;
            }
        };

        let local_rounds: Vec<RoundRecord> = self
            .rounds
            .iter()
            .filter(|round| round.origin == Origin::Local)
            .cloned()
            .collect();
        let merged = merge_rounds(&server_rounds, &local_rounds);
        self.rounds = merged.rounds;
        self.data_origin = merged.data_origin;

        if self
            .rounds
            .iter()
            .any(|round| round.round == self.session.round())
        {
            warn!(
                match_id = self.match_id,
                round = self.session.round(),
                "server already holds the round being scored; starting the next one"
            );
            let mut session = ScoringSession::new(next_round_number(&self.rounds));
            session.set_half(self.session.half());
            self.session = session;
        }

        true
    }

    async fn persist_session(&mut self) {
        if !self.recover_unread_records().await {
            self.defer_write();
            return;
        }
        if !self.cache_in_sync {
            // The previous write failed; rewrite everything.
            self.persist_all().await;
            return;
        }
        let result = self.cache.save_session(self.match_id, &self.session).await;
        self.record_write(result);
    }

    async fn persist_all(&mut self) {
        if !self.recover_unread_records().await {
            self.defer_write();
            return;
        }
        let result = match self.cache.save_local_rounds(self.match_id, &self.rounds).await {
            Ok(()) => self.cache.save_session(self.match_id, &self.session).await,
            Err(err) => Err(err),
        };
        self.record_write(result);
    }

    /// Re-read cache records that could not be read when the match was opened
    /// and fold their content back in. Returns false while any is still unreadable.
    async fn recover_unread_records(&mut self) -> bool {
        if self.unread.local_rounds {
            match self.cache.load_local_rounds(self.match_id).await {
                Ok(cached) => {
                    self.unread.local_rounds = false;
                    self.absorb_cached_rounds(cached);
                }
                Err(err) => {
                    self.unread.local_rounds = report_cache_read(
                        self.notifier.as_ref(),
                        self.match_id,
                        LOCAL_ROUNDS_NAMESPACE,
                        &err,
                    );
                }
            }
        }

        if self.unread.session {
            match self.cache.load_session(self.match_id).await {
                Ok(stored) => {
                    self.unread.session = false;
                    self.absorb_cached_session(stored);
                }
                Err(err) => {
                    self.unread.session = report_cache_read(
                        self.notifier.as_ref(),
                        self.match_id,
                        SESSION_NAMESPACE,
                        &err,
                    );
                }
            }
        }

        !self.unread.any()
    }

    /// Merge cached local rounds read late into the working list.
    ///
    /// Cached rounds keep their numbers; rounds finalized in memory since the
    /// match was opened move past them when their number is already taken.
    fn absorb_cached_rounds(&mut self, cached: Vec<RoundRecord>) {
        if cached.is_empty() {
            return;
        }

        let server_rounds: Vec<RoundRecord> = self
            .rounds
            .iter()
            .filter(|round| round.is_authoritative())
            .cloned()
            .collect();
        let mut taken: Vec<u32> = server_rounds
            .iter()
            .chain(cached.iter())
            .map(|round| round.round)
            .collect();
        let mut local_rounds = cached;
        for mut round in self
            .rounds
            .iter()
            .filter(|round| round.origin == Origin::Local)
            .cloned()
        {
            if taken.contains(&round.round) {
                let renumbered = taken.iter().max().map_or(1, |last| last + 1);
                warn!(
                    match_id = self.match_id,
                    from = round.round,
                    to = renumbered,
                    "renumbering round finalized before the cache could be read"
                );
                round.round = renumbered;
            }
            taken.push(round.round);
            local_rounds.push(round);
        }

        let merged = merge_rounds(&server_rounds, &local_rounds);
        info!(
            match_id = self.match_id,
            rounds = merged.rounds.len(),
            "cached local rounds recovered"
        );
        self.rounds = merged.rounds;
        if merged.data_origin != DataOrigin::New {
            self.data_origin = merged.data_origin;
        }

        let next = next_round_number(&self.rounds);
        if self.session.round() < next {
            self.session.set_round(next);
        }
    }

    /// Adopt a cached session read late, unless the live one already has points.
    fn absorb_cached_session(&mut self, stored: Option<ScoringSession>) {
        let Some(stored) = stored else {
            return;
        };
        if stored.round() != self.session.round() {
            debug!(
                match_id = self.match_id,
                stored_round = stored.round(),
                "discarding stale scoring session"
            );
        } else if self.session.is_empty() {
            info!(match_id = self.match_id, round = stored.round(), "cached scoring session recovered");
            self.session = stored;
        } else {
            warn!(
                match_id = self.match_id,
                round = stored.round(),
                "cached scoring session superseded by live points"
            );
        }
    }

    fn defer_write(&mut self) {
        warn!(match_id = self.match_id, "scoring cache unreadable; write deferred");
        self.cache_in_sync = false;
        self.notify(Notice::PersistFailed {
            message: "scoring cache unreadable; write deferred".into(),
        });
    }

    fn record_write(&mut self, result: Result<(), PersistenceError>) {
        match result {
            Ok(()) => {
                if !self.cache_in_sync {
                    info!(match_id = self.match_id, "scoring cache back in sync");
                }
                self.cache_in_sync = true;
            }
            Err(err) => {
                warn!(match_id = self.match_id, error = %err, "failed to persist scoring cache");
                self.cache_in_sync = false;
                self.notify(Notice::PersistFailed {
                    message: err.to_string(),
                });
            }
        }
    }

    fn reject(&self, err: ScoringError) {
        if let Some(notice) = Notice::for_rejection(err) {
            self.notify(notice);
        }
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(self.match_id, notice);
    }
}

/// Round number following the highest one in `rounds`.
pub fn next_round_number(rounds: &[RoundRecord]) -> u32 {
    rounds
        .iter()
        .map(|round| round.round)
        .max()
        .map_or(1, |last| last + 1)
}

/// Keep the cached session only when it belongs to the round about to be scored.
fn resume_session(
    match_id: MatchId,
    rounds: &[RoundRecord],
    stored: Option<ScoringSession>,
) -> ScoringSession {
    let next = next_round_number(rounds);
    match stored {
        Some(session) if session.round() == next => {
            debug!(match_id, round = next, "resuming cached scoring session");
            session
        }
        Some(session) => {
            debug!(
                match_id,
                stored_round = session.round(),
                next_round = next,
                "discarding stale scoring session"
            );
            ScoringSession::new(next)
        }
        None => ScoringSession::new(next),
    }
}

/// Report a failed cache read. Returns true when the record could not be
/// read at all and must not be overwritten yet; corrupt data reads as absent.
fn report_cache_read(
    notifier: &dyn Notifier,
    match_id: MatchId,
    namespace: &str,
    err: &PersistenceError,
) -> bool {
    let record = storage_key(namespace, match_id);
    if err.is_corrupt() {
        warn!(match_id, record = %record, error = %err, "ignoring corrupt scoring cache");
        notifier.notify(match_id, Notice::CorruptPersistedData { record });
        false
    } else {
        warn!(match_id, record = %record, error = %err, "scoring cache unreadable; keeping it untouched");
        true
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use futures::future::BoxFuture;

    use super::*;
    use crate::dao::{
        kv_store::memory::MemoryStore,
        match_api::error::MatchApiResult,
        storage::{StorageError, StorageResult},
    };

    const MATCH_ID: MatchId = 21;

    #[derive(Default)]
    struct FakeApi {
        server_rounds: Mutex<Option<Vec<RoundRecord>>>,
        submitted: Mutex<Vec<Vec<RoundRecord>>>,
        reject_submit: bool,
        accept_into_server: bool,
    }

    impl FakeApi {
        fn with_rounds(rounds: Vec<RoundRecord>) -> Self {
            Self {
                server_rounds: Mutex::new(Some(rounds)),
                ..Self::default()
            }
        }

        fn unreachable() -> Self {
            Self::default()
        }

        fn set_rounds(&self, rounds: Vec<RoundRecord>) {
            *self.server_rounds.lock().unwrap() = Some(rounds);
        }
    }

    impl MatchApi for FakeApi {
        fn fetch_match_rounds(
            &self,
            _match_id: MatchId,
        ) -> BoxFuture<'static, MatchApiResult<Vec<RoundRecord>>> {
            let rounds = self.server_rounds.lock().unwrap().clone();
            Box::pin(async move { rounds.ok_or(MatchApiError::Offline) })
        }

        fn submit_match_rounds(
            &self,
            _match_id: MatchId,
            rounds: Vec<RoundRecord>,
        ) -> BoxFuture<'static, MatchApiResult<()>> {
            if self.reject_submit {
                return Box::pin(async { Err(MatchApiError::Offline) });
            }
            if self.accept_into_server {
                let stored = rounds
                    .iter()
                    .cloned()
                    .map(|mut round| {
                        round.origin = Origin::Server;
                        round
                    })
                    .collect();
                self.set_rounds(stored);
            }
            self.submitted.lock().unwrap().push(rounds);
            Box::pin(async { Ok(()) })
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        notices: Mutex<Vec<Notice>>,
    }

    impl RecordingNotifier {
        fn kinds(&self) -> Vec<&'static str> {
            self.notices
                .lock()
                .unwrap()
                .iter()
                .map(Notice::kind)
                .collect()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, _match_id: MatchId, notice: Notice) {
            self.notices.lock().unwrap().push(notice);
        }
    }

    /// Store whose writes fail until `healthy` is flipped.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        healthy: Mutex<bool>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
            if *self.healthy.lock().unwrap() {
                return self.inner.set(key, value);
            }
            let err = StorageError::write(
                key,
                "quota exceeded".into(),
                std::io::Error::other("quota exceeded"),
            );
            Box::pin(async move { Err(err) })
        }

        fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.remove(key)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    /// Store whose reads of one key fail while `failing_reads` is above zero.
    struct ReadFailingStore {
        inner: MemoryStore,
        key: String,
        failing_reads: Mutex<usize>,
    }

    impl ReadFailingStore {
        fn new(inner: MemoryStore, namespace: &str, failing_reads: usize) -> Self {
            Self {
                inner,
                key: storage_key(namespace, MATCH_ID),
                failing_reads: Mutex::new(failing_reads),
            }
        }
    }

    impl KeyValueStore for ReadFailingStore {
        fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
            let mut remaining = self.failing_reads.lock().unwrap();
            if key == self.key && *remaining > 0 {
                *remaining -= 1;
                let err = StorageError::unavailable(
                    "storage locked".into(),
                    std::io::Error::other("storage locked"),
                );
                return Box::pin(async move { Err(err) });
            }
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: String) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.remove(key)
        }

        fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
            self.inner.health_check()
        }
    }

    fn round(number: u32, origin: Origin) -> RoundRecord {
        RoundRecord {
            id: i64::from(number),
            match_id: MATCH_ID,
            round: number,
            note: String::new(),
            half: 1,
            team1_score: 11,
            team2_score: 4,
            log: Vec::new(),
            origin,
        }
    }

    struct Harness {
        api: Arc<FakeApi>,
        store: MemoryStore,
        notifier: Arc<RecordingNotifier>,
    }

    impl Harness {
        fn new(api: FakeApi) -> Self {
            Self {
                api: Arc::new(api),
                store: MemoryStore::new(),
                notifier: Arc::new(RecordingNotifier::default()),
            }
        }

        fn collaborators(&self) -> Collaborators {
            Collaborators {
                api: self.api.clone(),
                store: Arc::new(self.store.clone()),
                notifier: self.notifier.clone(),
            }
        }

        fn seed_local(&self, rounds: &[RoundRecord]) {
            self.store.seed(
                storage_key(LOCAL_ROUNDS_NAMESPACE, MATCH_ID),
                serde_json::to_string(rounds).unwrap(),
            );
        }

        async fn open(&self) -> MatchScorer {
            MatchScorer::open(MATCH_ID, WinScoreSetting::Eleven, &self.collaborators()).await
        }
    }

    async fn win_round(scorer: &mut MatchScorer) -> Result<RoundRecord, ScoringError> {
        for _ in 0..11 {
            scorer.add_point(Team::One, 1).await?;
        }
        scorer.finalize_round().await
    }

    #[tokio::test]
    async fn open_merges_server_and_cached_rounds() {
        let harness = Harness::new(FakeApi::with_rounds(vec![round(1, Origin::Server)]));
        harness.seed_local(&[round(1, Origin::Local), round(2, Origin::Local)]);

        let scorer = harness.open().await;

        assert_eq!(
            scorer.rounds(),
            &[round(1, Origin::Server), round(2, Origin::Local)]
        );
        assert_eq!(scorer.data_origin(), DataOrigin::Server);
        assert_eq!(scorer.session().round(), 3);
        assert!(harness.notifier.kinds().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_local_rounds() {
        let harness = Harness::new(FakeApi::unreachable());
        harness.seed_local(&[round(1, Origin::Local)]);

        let scorer = harness.open().await;

        assert_eq!(scorer.rounds(), &[round(1, Origin::Local)]);
        assert_eq!(scorer.data_origin(), DataOrigin::Local);
        assert_eq!(harness.notifier.kinds(), vec!["network_fetch_failed"]);
    }

    #[tokio::test]
    async fn corrupt_cache_reads_as_absent() {
        let harness = Harness::new(FakeApi::with_rounds(Vec::new()));
        harness
            .store
            .seed(storage_key(LOCAL_ROUNDS_NAMESPACE, MATCH_ID), "[{]");

        let scorer = harness.open().await;

        assert!(scorer.rounds().is_empty());
        assert_eq!(scorer.data_origin(), DataOrigin::New);
        assert_eq!(harness.notifier.kinds(), vec!["corrupt_persisted_data"]);
    }

    #[tokio::test]
    async fn in_progress_session_survives_reload() {
        let harness = Harness::new(FakeApi::with_rounds(Vec::new()));
        {
            let mut scorer = harness.open().await;
            scorer.add_point(Team::One, 1).await.unwrap();
            scorer.add_point(Team::Two, 2).await.unwrap();
            scorer.set_notes("wind from the left".into()).await;
        }

        let reloaded = harness.open().await;

        assert_eq!(reloaded.session().team1_score(), 1);
        assert_eq!(reloaded.session().team2_score(), 2);
        assert_eq!(reloaded.session().history().len(), 2);
        assert_eq!(reloaded.session().notes(), "wind from the left");
    }

    #[tokio::test]
    async fn stale_session_snapshot_is_discarded() {
        let harness = Harness::new(FakeApi::with_rounds(vec![round(1, Origin::Server)]));
        let mut stale = ScoringSession::new(1);
        stale.add_point(Team::One, 4).unwrap();
        harness.store.seed(
            storage_key(SESSION_NAMESPACE, MATCH_ID),
            serde_json::to_string(&stale).unwrap(),
        );

        let scorer = harness.open().await;

        assert_eq!(scorer.session().round(), 2);
        assert!(scorer.session().is_empty());
    }

    #[tokio::test]
    async fn finalize_persists_local_round_and_notifies() {
        let harness = Harness::new(FakeApi::with_rounds(Vec::new()));
        let mut scorer = harness.open().await;

        let record = win_round(&mut scorer).await.unwrap();

        assert_eq!(record.origin, Origin::Local);
        assert_eq!(scorer.data_origin(), DataOrigin::Local);
        assert_eq!(scorer.session().round(), 2);
        let cached: Vec<RoundRecord> = serde_json::from_str(
            &harness
                .store
                .peek(&storage_key(LOCAL_ROUNDS_NAMESPACE, MATCH_ID))
                .unwrap(),
        )
        .unwrap();
        assert_eq!(cached, vec![record]);
        assert_eq!(harness.notifier.kinds(), vec!["round_finalized"]);
    }

    #[tokio::test]
    async fn rejected_finalize_and_undo_raise_notices() {
        let harness = Harness::new(FakeApi::with_rounds(Vec::new()));
        let mut scorer = harness.open().await;

        assert_eq!(
            scorer.finalize_round().await.unwrap_err(),
            ScoringError::EmptyRound
        );
        assert_eq!(
            scorer.undo_last().await.unwrap_err(),
            ScoringError::UndoUnavailable
        );
        scorer.add_point(Team::Two, 1).await.unwrap();
        assert_eq!(
            scorer.finalize_round().await.unwrap_err(),
            ScoringError::NoWinnerYet
        );
        scorer.undo_last().await.unwrap();

        assert_eq!(
            harness.notifier.kinds(),
            vec![
                "empty_round",
                "undo_unavailable",
                "no_winner_yet",
                "undo_applied"
            ]
        );
    }

    #[tokio::test]
    async fn fourth_round_is_refused() {
        let harness = Harness::new(FakeApi::with_rounds(Vec::new()));
        let mut scorer = harness.open().await;
        for _ in 0..MAX_ROUNDS_PER_MATCH {
            win_round(&mut scorer).await.unwrap();
        }

        let err = win_round(&mut scorer).await.unwrap_err();

        assert_eq!(err, ScoringError::RoundLimitExceeded);
        assert_eq!(scorer.rounds().len(), 3);
        assert!(scorer.round_limit_reached());
        assert_eq!(
            harness.notifier.kinds().last().copied(),
            Some("round_limit_exceeded")
        );
    }

    #[tokio::test]
    async fn refresh_supersedes_local_round_without_double_counting() {
        let harness = Harness::new(FakeApi::with_rounds(Vec::new()));
        let mut scorer = harness.open().await;
        win_round(&mut scorer).await.unwrap();
        scorer.add_point(Team::Two, 1).await.unwrap();

        harness.api.set_rounds(vec![round(1, Origin::Server)]);
        let origin = scorer.refresh().await;

        assert_eq!(origin, DataOrigin::Server);
        assert_eq!(scorer.rounds(), &[round(1, Origin::Server)]);
        assert_eq!(scorer.session().round(), 2);
        assert_eq!(scorer.session().team2_score(), 1);
        assert_eq!(
            harness
                .store
                .peek(&storage_key(LOCAL_ROUNDS_NAMESPACE, MATCH_ID)),
            None
        );
    }

    #[tokio::test]
    async fn successful_submit_clears_cache() {
        let harness = Harness::new(FakeApi {
            server_rounds: Mutex::new(Some(Vec::new())),
            accept_into_server: true,
            ..FakeApi::default()
        });
        let mut scorer = harness.open().await;
        win_round(&mut scorer).await.unwrap();
        win_round(&mut scorer).await.unwrap();

        let submitted = scorer.end_match().await.unwrap();

        assert_eq!(submitted, 2);
        assert!(harness.store.is_empty());
        assert_eq!(harness.api.submitted.lock().unwrap()[0].len(), 2);
        assert!(scorer.rounds().iter().all(RoundRecord::is_authoritative));
        assert_eq!(
            harness.notifier.kinds().last().copied(),
            Some("submit_succeeded")
        );
    }

    #[tokio::test]
    async fn failed_submit_keeps_cache() {
        let harness = Harness::new(FakeApi {
            server_rounds: Mutex::new(Some(Vec::new())),
            reject_submit: true,
            ..FakeApi::default()
        });
        let mut scorer = harness.open().await;
        win_round(&mut scorer).await.unwrap();

        assert!(scorer.end_match().await.is_err());

        assert!(
            harness
                .store
                .peek(&storage_key(LOCAL_ROUNDS_NAMESPACE, MATCH_ID))
                .is_some()
        );
        assert_eq!(scorer.rounds().len(), 1);
        assert_eq!(
            harness.notifier.kinds().last().copied(),
            Some("submit_failed")
        );
    }

    #[tokio::test]
    async fn failed_write_does_not_block_scoring_and_is_retried() {
        let api = Arc::new(FakeApi::with_rounds(Vec::new()));
        let store = Arc::new(FlakyStore::default());
        let notifier = Arc::new(RecordingNotifier::default());
        let collaborators = Collaborators {
            api: api.clone(),
            store: store.clone(),
            notifier: notifier.clone(),
        };
        let mut scorer = MatchScorer::open(MATCH_ID, WinScoreSetting::Eleven, &collaborators).await;

        scorer.add_point(Team::One, 1).await.unwrap();

        assert_eq!(scorer.session().team1_score(), 1);
        assert!(!scorer.cache_in_sync());
        assert_eq!(notifier.kinds(), vec!["persist_failed"]);

        *store.healthy.lock().unwrap() = true;
        scorer.add_point(Team::One, 1).await.unwrap();

        assert!(scorer.cache_in_sync());
        assert!(
            store
                .inner
                .peek(&storage_key(SESSION_NAMESPACE, MATCH_ID))
                .is_some()
        );
    }

    #[tokio::test]
    async fn abandoning_drops_local_rounds_only() {
        let harness = Harness::new(FakeApi::with_rounds(vec![round(1, Origin::Server)]));
        harness.seed_local(&[round(2, Origin::Local)]);
        let mut scorer = harness.open().await;
        scorer.add_point(Team::One, 2).await.unwrap();

        let dropped = scorer.abandon_local_rounds().await;

        assert_eq!(dropped, 1);
        assert_eq!(scorer.rounds(), &[round(1, Origin::Server)]);
        assert_eq!(scorer.session().round(), 2);
        assert!(scorer.session().is_empty());
        assert!(harness.store.is_empty());
    }

    fn cached_round_numbers(store: &MemoryStore) -> Vec<u32> {
        let cached: Vec<RoundRecord> = serde_json::from_str(
            &store
                .peek(&storage_key(LOCAL_ROUNDS_NAMESPACE, MATCH_ID))
                .unwrap(),
        )
        .unwrap();
        cached.iter().map(|round| round.round).collect()
    }

    #[tokio::test]
    async fn unreadable_cache_is_read_back_before_it_is_overwritten() {
        let harness = Harness::new(FakeApi::unreachable());
        harness.seed_local(&[round(1, Origin::Local), round(2, Origin::Local)]);
        let store = Arc::new(ReadFailingStore::new(
            harness.store.clone(),
            LOCAL_ROUNDS_NAMESPACE,
            1,
        ));
        let collaborators = Collaborators {
            store,
            ..harness.collaborators()
        };
        let mut scorer = MatchScorer::open(MATCH_ID, WinScoreSetting::Eleven, &collaborators).await;
        assert!(scorer.rounds().is_empty());
        assert!(!harness.notifier.kinds().contains(&"corrupt_persisted_data"));

        let record = win_round(&mut scorer).await.unwrap();

        assert_eq!(record.round, 3);
        assert_eq!(scorer.rounds().len(), 3);
        assert_eq!(scorer.session().round(), 4);
        assert_eq!(cached_round_numbers(&harness.store), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn writes_wait_while_cache_stays_unreadable() {
        let harness = Harness::new(FakeApi::unreachable());
        harness.seed_local(&[round(1, Origin::Local), round(2, Origin::Local)]);
        let store = Arc::new(ReadFailingStore::new(
            harness.store.clone(),
            LOCAL_ROUNDS_NAMESPACE,
            usize::MAX,
        ));
        let collaborators = Collaborators {
            store: store.clone(),
            ..harness.collaborators()
        };
        let mut scorer = MatchScorer::open(MATCH_ID, WinScoreSetting::Eleven, &collaborators).await;

        let record = win_round(&mut scorer).await.unwrap();

        assert_eq!(record.round, 1);
        assert!(!scorer.cache_in_sync());
        assert_eq!(cached_round_numbers(&harness.store), vec![1, 2]);
        assert!(harness.notifier.kinds().contains(&"persist_failed"));
        assert!(matches!(
            scorer.end_match().await,
            Err(EndMatchError::CacheUnreadable)
        ));
        assert!(harness.api.submitted.lock().unwrap().is_empty());

        *store.failing_reads.lock().unwrap() = 0;
        scorer.add_point(Team::Two, 1).await.unwrap();

        assert!(scorer.cache_in_sync());
        assert_eq!(
            scorer.rounds().iter().map(|round| round.round).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(scorer.session().round(), 4);
        assert_eq!(scorer.session().team2_score(), 1);
        assert_eq!(cached_round_numbers(&harness.store), vec![1, 2, 3]);
    }
}
