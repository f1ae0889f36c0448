use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use super::types::{
    LogSoloSetRequest, PersonalRecords, SessionDetail, SessionListResponse, SessionResponse,
    StartSessionBody,
};
use crate::{
    auth::Caller,
    shared::{AppError, AppState, MessageResponse},
    workout::types::SetLoggedResponse,
};

/// HTTP handler for starting a solo session
///
/// POST /api/solo/sessions
/// Name is optional and defaults to "Solo Workout"
#[instrument(name = "start_session", skip(state, payload))]
pub async fn start_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<StartSessionBody>, JsonRejection>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let Json(body) = payload?;

    let session = state
        .solo_service
        .start_session(&caller.user_id, body.name.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SessionResponse {
            message: "Solo session started".to_string(),
            session,
        }),
    ))
}

/// GET /api/solo/sessions/active
#[instrument(name = "active_sessions", skip(state))]
pub async fn active_sessions(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.solo_service.active_sessions(&caller.user_id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// GET /api/solo/sessions/history
#[instrument(name = "session_history", skip(state))]
pub async fn session_history(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.solo_service.session_history(&caller.user_id).await?;
    Ok(Json(SessionListResponse { sessions }))
}

/// GET /api/solo/sessions/:session_id
#[instrument(name = "session_detail", skip(state))]
pub async fn session_detail(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionDetail>, AppError> {
    let detail = state
        .solo_service
        .session_detail(&caller.user_id, &session_id)
        .await?;
    Ok(Json(detail))
}

/// HTTP handler for completing a solo session
///
/// POST /api/solo/sessions/:session_id/end
#[instrument(name = "end_session", skip(state))]
pub async fn end_session(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state
        .solo_service
        .end_session(&caller.user_id, &session_id)
        .await?;

    Ok(Json(SessionResponse {
        message: "Session completed!".to_string(),
        session,
    }))
}

/// GET /api/solo/records
#[instrument(name = "personal_records", skip(state))]
pub async fn personal_records(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<PersonalRecords>, AppError> {
    let records = state.solo_service.personal_records(&caller.user_id).await?;
    Ok(Json(records))
}

/// POST /api/solo/sets
#[instrument(name = "log_solo_set", skip(state, payload))]
pub async fn log_solo_set(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<LogSoloSetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SetLoggedResponse>), AppError> {
    let Json(request) = payload?;

    let set = state
        .solo_service
        .log_set(&caller.user_id, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(SetLoggedResponse {
            message: "Set logged".to_string(),
            set,
        }),
    ))
}

/// DELETE /api/solo/sets/:set_id
#[instrument(name = "delete_solo_set", skip(state))]
pub async fn delete_solo_set(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(set_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .solo_service
        .delete_set(&caller.user_id, &set_id)
        .await?;
    Ok(Json(MessageResponse::new("Set deleted")))
}
