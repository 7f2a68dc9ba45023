//! 同步总线 SSE 流
//!
//! Replaces the document store's live-query subscriptions: clients hold
//! one EventSource on `/api/events` and re-render from the sync payloads
//! (every order/manager-pin mutation, including the lifecycle engine's
//! own patches, arrives here).

use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::Stream;
use tokio::sync::broadcast::error::RecvError;

use crate::core::ServerState;

/// Events router
pub fn router() -> Router<ServerState> {
    Router::new().route("/api/events", get(stream))
}

/// GET /api/events - Subscribe to the sync bus
///
/// Slow consumers that lag past the channel capacity lose the skipped
/// messages (logged); they are expected to re-fetch on reconnect.
async fn stream(
    State(state): State<ServerState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.bus.subscribe();

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(msg) => {
                    let event = match Event::default()
                        .event(msg.event_type.to_string())
                        .json_data(&msg)
                    {
                        Ok(event) => event,
                        Err(e) => {
                            tracing::warn!(error = %e, "Failed to encode bus message for SSE");
                            continue;
                        }
                    };
                    return Some((Ok::<_, Infallible>(event), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "SSE subscriber lagging, messages dropped");
                    continue;
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
