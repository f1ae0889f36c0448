use axum::{
    extract::State,
    response::sse::{Event, Sse},
    Extension,
};
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::{info, instrument};

use crate::{auth::Caller, shared::AppState, stream::sse_response};

/// HTTP handler for the caller's personal event stream
///
/// GET /api/notifications/stream
/// Carries competition request lifecycle events addressed to the caller
#[instrument(name = "notification_stream", skip(state))]
pub async fn notification_stream(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let subscription = state.hub.subscribe_user(&caller.user_id);
    info!(
        user_id = %caller.user_id,
        streams = state.hub.user_subscribers(&caller.user_id),
        "Notification stream opened"
    );
    sse_response(subscription, &state.stream_config)
}
