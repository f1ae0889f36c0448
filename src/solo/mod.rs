// Single-user workout sessions: active → completed

// Public API - what other modules can use
pub use handlers::{
    active_sessions, delete_solo_set, end_session, log_solo_set, personal_records,
    session_detail, session_history, start_session,
};
pub use service::SoloService;

// Internal modules
mod handlers;
pub mod models;
mod service;
pub mod types;
