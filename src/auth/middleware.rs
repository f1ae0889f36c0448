use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::{debug, instrument, warn};

use super::types::Caller;
use crate::shared::{AppError, AppState};

/// JWT authentication middleware - validates the Authorization Bearer header and adds
/// the `Caller` to the request.
/// Usage: .route_layer(middleware::from_fn_with_state(app_state.clone(), auth::require_auth))
/// Handlers can then extract Extension(caller): Extension<Caller>.
#[instrument(skip(state, req, next), fields(uri = %req.uri()))]
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            warn!("Missing Authorization header in request");
            AppError::Unauthorized("No token provided".to_string())
        })?;

    let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
        warn!("Invalid Authorization header format (expected Bearer token)");
        AppError::Unauthorized("No token provided".to_string())
    })?;

    let claims = match state.token_config.validate_token(token) {
        Ok(claims) => claims,
        Err(e) => {
            warn!("JWT authentication failed: {}", e);
            return Err(e);
        }
    };

    debug!(user_id = %claims.user_id, "Authentication successful");

    req.extensions_mut().insert(Caller::from(claims));

    Ok(next.run(req).await)
}
