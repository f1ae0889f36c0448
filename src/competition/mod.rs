// Competition lifecycle: pending request → active duel → completed

// Public API - what other modules can use
pub use handlers::{
    accept_request, active_competitions, competition_detail, competition_history,
    competition_stream, decline_request, end_competition, incoming_requests, outgoing_requests,
    request_competition,
};
pub use service::CompetitionService;

// Internal modules
mod handlers;
pub mod models;
mod service;
pub mod types;
