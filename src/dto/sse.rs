use serde::Serialize;

use crate::services::notifications::MatchNotice;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Event named after the notice kind, carrying the notice as JSON.
    pub fn from_notice(notice: &MatchNotice) -> serde_json::Result<Self> {
        Self::json(Some(notice.notice.kind().to_owned()), notice)
    }
}
