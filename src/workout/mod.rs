// Set logging inside competitions

// Public API - what other modules can use
pub use handlers::{delete_set, log_set, log_sets_batch, my_sets};
pub use service::WorkoutService;

// Internal modules
mod handlers;
pub mod models;
mod service;
pub mod types;
