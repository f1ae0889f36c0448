// Library crate for the Fit Fighter duel tracker
// This file exposes the public API for the binary and integration tests

pub mod auth;
pub mod competition;
pub mod config;
pub mod event;
pub mod friends;
pub mod notifications;
pub mod router;
pub mod scoring;
pub mod shared;
pub mod solo;
pub mod store;
pub mod stream;
pub mod users;
pub mod workout;

// Re-export commonly used types for easier access in tests
pub use auth::{Caller, TokenConfig};
pub use config::{AppConfig, StorageConfig};
pub use event::{CompetitionEvent, EventHub, StreamEvent, UserNotification};
pub use friends::{Friendship, Friendships};
pub use router::build_router;
pub use shared::{AppError, AppState};
pub use store::Store;
pub use stream::StreamConfig;
pub use users::{User, UserDirectory};
