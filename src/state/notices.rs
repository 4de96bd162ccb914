use tokio::sync::broadcast;
use tracing::debug;

use crate::{
    scoring::MatchId,
    services::notifications::{MatchNotice, Notice, Notifier},
};

/// Broadcast hub fanning out facade notices to every open event stream.
pub struct NoticeHub {
    sender: broadcast::Sender<MatchNotice>,
}

impl NoticeHub {
    /// Construct a new hub backed by a Tokio broadcast channel with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _receiver) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Register a new subscriber that will receive subsequent notices.
    pub fn subscribe(&self) -> broadcast::Receiver<MatchNotice> {
        self.sender.subscribe()
    }
}

impl Notifier for NoticeHub {
    fn notify(&self, match_id: MatchId, notice: Notice) {
        debug!(match_id, kind = notice.kind(), "notice raised");
        // No subscriber is not an error.
        let _ = self.sender.send(MatchNotice { match_id, notice });
    }
}
