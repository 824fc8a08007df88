// Read-only spectator feed over server-sent events.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use serde::Deserialize;

use crate::server::http::ApiError;
use crate::server::AppState;

#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub room: String,
    /// First sequence number to deliver; defaults to a full replay.
    #[serde(default)]
    pub from: Option<u64>,
}

/// `GET /events?room=R&from=N`. Every viewer-only field is withheld. The
/// SSE `id` is the sequence number and `event` is the kind name.
pub async fn events_handler(
    State(state): State<AppState>,
    Query(q): Query<FeedQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let room = state.registry.get(&q.room).await?;
    tracing::debug!(room = %q.room, from = ?q.from, "spectator subscribed");
    let feed = room.subscribe(q.from.unwrap_or(1)).map(|event| {
        let env = event.view_for(None);
        Event::default()
            .id(env.seq.to_string())
            .event(env.kind.name())
            .json_data(&env)
    });
    Ok(Sse::new(feed).keep_alive(KeepAlive::default()))
}
