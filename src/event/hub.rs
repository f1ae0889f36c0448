use serde::Serialize;
use tracing::{error, instrument};

use super::events::{CompetitionEvent, StreamEvent, UserNotification};
use super::registry::{BroadcastRegistry, Subscription};

/// Default per-subscriber queue depth
pub const DEFAULT_SUBSCRIBER_BUFFER: usize = 64;

/// Two independent fan-out tiers: competition rooms and per-user inboxes
#[derive(Clone)]
pub struct EventHub {
    competitions: BroadcastRegistry<String>,
    users: BroadcastRegistry<String>,
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new(DEFAULT_SUBSCRIBER_BUFFER)
    }
}

impl EventHub {
    pub fn new(subscriber_buffer: usize) -> Self {
        Self {
            competitions: BroadcastRegistry::new(subscriber_buffer),
            users: BroadcastRegistry::new(subscriber_buffer),
        }
    }

    pub fn subscribe_competition(&self, competition_id: &str) -> Subscription<String> {
        self.competitions.subscribe(competition_id.to_string())
    }

    pub fn subscribe_user(&self, user_id: &str) -> Subscription<String> {
        self.users.subscribe(user_id.to_string())
    }

    /// Broadcasts to every open stream of one competition.
    #[instrument(skip(self, event), fields(event = event.name()))]
    pub fn publish_competition(&self, competition_id: &str, event: CompetitionEvent) -> usize {
        match encode(event.name(), &event) {
            Some(stream_event) => self.competitions.publish(competition_id, stream_event),
            None => 0,
        }
    }

    /// Delivers to every open notification stream of one user.
    #[instrument(skip(self, notification), fields(event = notification.name()))]
    pub fn notify_user(&self, user_id: &str, notification: UserNotification) -> usize {
        match encode(notification.name(), &notification) {
            Some(stream_event) => self.users.publish(user_id, stream_event),
            None => 0,
        }
    }

    pub fn competition_subscribers(&self, competition_id: &str) -> usize {
        self.competitions.subscriber_count(competition_id)
    }

    pub fn user_subscribers(&self, user_id: &str) -> usize {
        self.users.subscriber_count(user_id)
    }

    /// Keys currently holding subscribers, as (competitions, users)
    pub fn active_keys(&self) -> (usize, usize) {
        (self.competitions.key_count(), self.users.key_count())
    }
}

fn encode<T: Serialize>(name: &'static str, payload: &T) -> Option<StreamEvent> {
    StreamEvent::from_payload(name, payload)
        .map_err(|e| error!(event = name, error = %e, "Failed to encode event payload"))
        .ok()
}
