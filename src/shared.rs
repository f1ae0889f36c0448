use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;

use crate::auth::TokenConfig;
use crate::competition::CompetitionService;
use crate::event::EventHub;
use crate::solo::SoloService;
use crate::store::Store;
use crate::stream::StreamConfig;
use crate::workout::WorkoutService;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub hub: EventHub,
    pub token_config: TokenConfig,
    pub stream_config: StreamConfig,
    pub competition_service: Arc<CompetitionService>,
    pub workout_service: Arc<WorkoutService>,
    pub solo_service: Arc<SoloService>,
}

impl AppState {
    pub fn new(
        store: Store,
        hub: EventHub,
        token_config: TokenConfig,
        stream_config: StreamConfig,
    ) -> Self {
        let competition_service = Arc::new(CompetitionService::new(store.clone(), hub.clone()));
        let workout_service = Arc::new(WorkoutService::new(store.clone(), hub.clone()));
        let solo_service = Arc::new(SoloService::new(store.clone()));

        Self {
            store,
            hub,
            token_config,
            stream_config,
            competition_service,
            workout_service,
            solo_service,
        }
    }
}

/// `{ "message": ... }` body for actions with nothing else to return
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("JWT error: {0}")]
    JwtError(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Missing entities and entities in a state that forbids the action
    /// both land here.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::JwtError(_) => (
                StatusCode::UNAUTHORIZED,
                "Invalid or expired token".to_string(),
            ),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::Storage(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Storage error: {}", msg),
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
