// Bearer-token authentication. Token issuance happens outside this server;
// the helpers here exist so both sides agree on the claim layout.

// Public API - what other modules can use
pub use middleware::require_auth;
pub use token::TokenConfig;
pub use types::{AuthClaims, Caller};

// Internal modules
mod middleware;
mod token;
mod types;
