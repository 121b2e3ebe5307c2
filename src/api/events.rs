//! Change notification stream.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;

use crate::AppState;

/// GET /api/events - Server-sent template changes.
pub async fn stream_events(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.events.subscribe();
    tracing::debug!("{} event subscribers connected", state.events.subscriber_count());
    subscription.into_sse()
}
