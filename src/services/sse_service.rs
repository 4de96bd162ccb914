use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{info, warn};

use crate::{
    dto::sse::ServerEvent, scoring::MatchId, services::notifications::MatchNotice,
    state::SharedState,
};

/// Subscribe to the notices raised by every open match.
pub fn subscribe_notices(state: &SharedState) -> broadcast::Receiver<MatchNotice> {
    state.notices().subscribe()
}

/// Convert a notice receiver into an SSE response carrying only the notices of
/// `match_id`, until the client disconnects.
pub fn to_sse_stream(
    mut receiver: broadcast::Receiver<MatchNotice>,
    match_id: MatchId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    // small bounded channel between forwarder and response
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(notice) if notice.match_id == match_id => {
                            let payload = match ServerEvent::from_notice(&notice) {
                                Ok(payload) => payload,
                                Err(err) => {
                                    warn!(match_id, error = %err, "failed to encode notice");
                                    continue;
                                }
                            };
                            let mut event = Event::default().data(payload.data);
                            if let Some(name) = payload.event {
                                event = event.event(name);
                            }

                            if tx.send(Ok(event)).await.is_err() {
                                break;
                            }
                        }
                        Ok(_) => continue,
                        Err(RecvError::Closed) => break,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(match_id, skipped, "notice stream lagged");
                            continue;
                        }
                    }
                }
            }
        }

        info!(match_id, "notice stream disconnected");
    });

    // response stream reads from mpsc; when client disconnects axum drops this stream
    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
