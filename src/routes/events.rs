use std::convert::Infallible;

use axum::{
    Router,
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    routing::get,
};
use futures::{Stream, stream};
use tokio::sync::broadcast::error::RecvError;

use crate::{events::ChangeEvent, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(change_stream))
}

/// Invalidation feed. Events carry {resource, action, id} and nothing else;
/// clients re-query whatever they display. A consumer that falls behind gets
/// a single `resync` event in place of the missed backlog.
#[utoipa::path(get, path = "/api/events", tag = "Events")]
pub async fn change_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.feed.subscribe();

    let stream = stream::unfold(rx, |mut rx| async move {
        loop {
            let payload = match rx.recv().await {
                Ok(ev) => ev,
                Err(RecvError::Lagged(_)) => ChangeEvent {
                    resource: "orders",
                    action: "resync",
                    id: None,
                },
                Err(RecvError::Closed) => return None,
            };
            match Event::default().event("change").json_data(&payload) {
                Ok(event) => return Some((Ok(event), rx)),
                Err(err) => {
                    tracing::warn!(error = %err, "dropping unserializable change event");
                    continue;
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
