// Live event fan-out
//
// Two keyed tiers share one registry implementation: competition rooms,
// keyed by competition id, and personal inboxes, keyed by user id.

// Public API - what other modules can use
pub use events::{
    CompetitionEvent, RequestAccepted, RequestDeclined, RequestReceived, SetDeleted, SetLogged,
    SetsLogged, StreamEvent, UserNotification,
};
pub use hub::{EventHub, DEFAULT_SUBSCRIBER_BUFFER};
pub use registry::{BroadcastRegistry, Subscription};

// Internal modules
mod events;
mod hub;
mod registry;
