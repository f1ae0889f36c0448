use axum::{
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    auth::require_auth, competition, notifications::notification_stream, shared::AppState, solo,
    workout,
};

pub const APP_NAME: &str = "Fit Fighter API";

/// Builds the full HTTP surface. Everything under `/api` requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    let competitions = Router::new()
        .route("/request", post(competition::request_competition))
        .route("/requests/incoming", get(competition::incoming_requests))
        .route("/requests/outgoing", get(competition::outgoing_requests))
        .route(
            "/request/:request_id/accept",
            post(competition::accept_request),
        )
        .route(
            "/request/:request_id/decline",
            post(competition::decline_request),
        )
        .route("/active", get(competition::active_competitions))
        .route("/history", get(competition::competition_history))
        .route("/:competition_id", get(competition::competition_detail))
        .route(
            "/:competition_id/stream",
            get(competition::competition_stream),
        )
        .route("/:competition_id/end", post(competition::end_competition));

    let workouts = Router::new()
        .route("/sets", post(workout::log_set))
        .route("/sets/batch", post(workout::log_sets_batch))
        .route(
            "/sets/:id",
            get(workout::my_sets).delete(workout::delete_set),
        );

    let solo = Router::new()
        .route("/sessions", post(solo::start_session))
        .route("/sessions/active", get(solo::active_sessions))
        .route("/sessions/history", get(solo::session_history))
        .route("/sessions/:session_id", get(solo::session_detail))
        .route("/sessions/:session_id/end", post(solo::end_session))
        .route("/records", get(solo::personal_records))
        .route("/sets", post(solo::log_solo_set))
        .route("/sets/:set_id", axum::routing::delete(solo::delete_solo_set));

    let notifications = Router::new().route("/stream", get(notification_stream));

    let api = Router::new()
        .nest("/competitions", competitions)
        .nest("/workouts", workouts)
        .nest("/solo", solo)
        .nest("/notifications", notifications)
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/", get(health))
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "app": APP_NAME }))
}

async fn route_not_found() -> (StatusCode, Json<Value>) {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
}
