mod notices;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::{
    config::AppConfig,
    dao::{kv_store::KeyValueStore, match_api::MatchApi},
    scoring::MatchId,
    services::scorer::{Collaborators, MatchScorer},
};

pub use self::notices::NoticeHub;

pub type SharedState = Arc<AppState>;
/// Handle to an open match; the mutex serializes operations on it.
pub type ScorerHandle = Arc<Mutex<MatchScorer>>;

/// Central application state: collaborators and the registry of open matches.
pub struct AppState {
    config: AppConfig,
    collaborators: Collaborators,
    store: Arc<dyn KeyValueStore>,
    notices: Arc<NoticeHub>,
    matches: DashMap<MatchId, ScorerHandle>,
    open_gate: Mutex<()>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(
        config: AppConfig,
        api: Arc<dyn MatchApi>,
        store: Arc<dyn KeyValueStore>,
    ) -> SharedState {
        let notices = Arc::new(NoticeHub::new(config.notice_capacity));
        let collaborators = Collaborators {
            api,
            store: Arc::clone(&store),
            notifier: notices.clone(),
        };
        Arc::new(Self {
            config,
            collaborators,
            store,
            notices,
            matches: DashMap::new(),
            open_gate: Mutex::new(()),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Collaborators handed to every facade opened by this process.
    pub fn collaborators(&self) -> &Collaborators {
        &self.collaborators
    }

    /// Durable store backing the scoring cache.
    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Broadcast hub fed by every open facade.
    pub fn notices(&self) -> &NoticeHub {
        &self.notices
    }

    /// Registry of open matches keyed by match id.
    pub fn matches(&self) -> &DashMap<MatchId, ScorerHandle> {
        &self.matches
    }

    /// Look up an open match.
    pub fn scorer(&self, match_id: MatchId) -> Option<ScorerHandle> {
        self.matches.get(&match_id).map(|entry| Arc::clone(entry.value()))
    }

    /// Gate serializing match opens so a match is never loaded twice concurrently.
    pub fn open_gate(&self) -> &Mutex<()> {
        &self.open_gate
    }
}
