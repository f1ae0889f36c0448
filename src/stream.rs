//! Server-Sent Events transport.
//!
//! Every stream opens with a `connected` event carrying `{}`, then relays
//! events from one hub subscription. An idle stream gets a `: heartbeat`
//! comment at the configured interval. When the client goes away axum drops
//! the response body, which drops the subscription and the keep-alive timer
//! with it.

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream, StreamExt};
use std::convert::Infallible;
use std::hash::Hash;
use std::time::Duration;

use crate::event::{StreamEvent, Subscription};

pub const CONNECTED_EVENT: &str = "connected";
pub const HEARTBEAT_COMMENT: &str = "heartbeat";

#[derive(Debug, Clone)]
pub struct StreamConfig {
    pub heartbeat_interval: Duration,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(30),
        }
    }
}

/// Wraps a subscription into an SSE response
pub fn sse_response<K>(
    subscription: Subscription<K>,
    config: &StreamConfig,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>>
where
    K: Eq + Hash + Send + 'static,
{
    let connected = stream::once(async { Ok(Event::default().event(CONNECTED_EVENT).data("{}")) });

    let events = stream::unfold(subscription, |mut subscription| async move {
        let event = subscription.recv().await?;
        Some((Ok(to_sse_event(&event)), subscription))
    });

    Sse::new(connected.chain(events)).keep_alive(
        KeepAlive::new()
            .interval(config.heartbeat_interval)
            .text(HEARTBEAT_COMMENT),
    )
}

fn to_sse_event(event: &StreamEvent) -> Event {
    Event::default().event(event.name).data(event.data.to_string())
}
