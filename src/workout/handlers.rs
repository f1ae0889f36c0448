use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use tracing::instrument;

use super::types::{
    BatchLoggedResponse, LogSetRequest, LogSetsBatchRequest, MySetsResponse, SetLoggedResponse,
};
use crate::{
    auth::Caller,
    shared::{AppError, AppState, MessageResponse},
};

/// HTTP handler for logging a set in a competition
///
/// POST /api/workouts/sets
#[instrument(name = "log_set", skip(state, payload))]
pub async fn log_set(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<LogSetRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SetLoggedResponse>), AppError> {
    let Json(request) = payload?;

    let set = state
        .workout_service
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

/// HTTP handler for logging several sets at once
///
/// POST /api/workouts/sets/batch
/// Invalid entries are skipped; the response lists only the logged sets
#[instrument(name = "log_sets_batch", skip(state, payload))]
pub async fn log_sets_batch(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<LogSetsBatchRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<BatchLoggedResponse>), AppError> {
    let Json(request) = payload?;

    let sets = state
        .workout_service
        .log_sets_batch(&caller.user_id, request)
        .await?;
    let count = sets.len();

    Ok((
        StatusCode::CREATED,
        Json(BatchLoggedResponse {
            message: format!("{} sets logged", count),
            sets,
            count,
        }),
    ))
}

/// GET /api/workouts/sets/:competition_id
#[instrument(name = "my_sets", skip(state))]
pub async fn my_sets(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(competition_id): Path<String>,
) -> Result<Json<MySetsResponse>, AppError> {
    let (sets, total_score) = state
        .workout_service
        .my_sets(&caller.user_id, &competition_id)
        .await?;
    Ok(Json(MySetsResponse { sets, total_score }))
}

/// DELETE /api/workouts/sets/:set_id
#[instrument(name = "delete_set", skip(state))]
pub async fn delete_set(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(set_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .workout_service
        .delete_set(&caller.user_id, &set_id)
        .await?;
    Ok(Json(MessageResponse::new("Set deleted")))
}
