use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::sse::{Event, Sse},
    Extension, Json,
};
use futures::stream::Stream;
use std::convert::Infallible;
use tracing::{info, instrument};

use super::types::{
    AcceptResponse, CompetitionDetail, CompetitionListResponse, CreateRequestBody, EndResponse,
    RequestCreatedResponse, RequestListResponse,
};
use crate::{
    auth::Caller,
    shared::{AppError, AppState, MessageResponse},
    stream::sse_response,
};

/// HTTP handler for challenging a friend
///
/// POST /api/competitions/request
#[instrument(name = "request_competition", skip(state, payload))]
pub async fn request_competition(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    payload: Result<Json<CreateRequestBody>, JsonRejection>,
) -> Result<(StatusCode, Json<RequestCreatedResponse>), AppError> {
    let Json(body) = payload?;

    let request = state
        .competition_service
        .request_competition(&caller.user_id, body.friend_id.as_deref())
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RequestCreatedResponse {
            message: "Competition request sent".to_string(),
            request,
        }),
    ))
}

/// GET /api/competitions/requests/incoming
#[instrument(name = "incoming_requests", skip(state))]
pub async fn incoming_requests(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<RequestListResponse>, AppError> {
    let requests = state
        .competition_service
        .incoming_requests(&caller.user_id)
        .await?;
    Ok(Json(RequestListResponse { requests }))
}

/// GET /api/competitions/requests/outgoing
#[instrument(name = "outgoing_requests", skip(state))]
pub async fn outgoing_requests(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<RequestListResponse>, AppError> {
    let requests = state
        .competition_service
        .outgoing_requests(&caller.user_id)
        .await?;
    Ok(Json(RequestListResponse { requests }))
}

/// HTTP handler for accepting a challenge
///
/// POST /api/competitions/request/:request_id/accept
/// Returns the newly started competition
#[instrument(name = "accept_request", skip(state))]
pub async fn accept_request(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<String>,
) -> Result<Json<AcceptResponse>, AppError> {
    let competition = state
        .competition_service
        .accept_request(&caller.user_id, &request_id)
        .await?;

    Ok(Json(AcceptResponse {
        message: "Competition started!".to_string(),
        competition,
    }))
}

/// POST /api/competitions/request/:request_id/decline
#[instrument(name = "decline_request", skip(state))]
pub async fn decline_request(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(request_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .competition_service
        .decline_request(&caller.user_id, &request_id)
        .await?;

    Ok(Json(MessageResponse::new("Competition request declined")))
}

/// GET /api/competitions/active
#[instrument(name = "active_competitions", skip(state))]
pub async fn active_competitions(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<CompetitionListResponse>, AppError> {
    let competitions = state
        .competition_service
        .active_competitions(&caller.user_id)
        .await?;
    Ok(Json(CompetitionListResponse { competitions }))
}

/// GET /api/competitions/history
#[instrument(name = "competition_history", skip(state))]
pub async fn competition_history(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
) -> Result<Json<CompetitionListResponse>, AppError> {
    let competitions = state
        .competition_service
        .competition_history(&caller.user_id)
        .await?;
    Ok(Json(CompetitionListResponse { competitions }))
}

/// HTTP handler for the duel view
///
/// GET /api/competitions/:competition_id
/// Returns both participants' sets with scores recomputed from them
#[instrument(name = "competition_detail", skip(state))]
pub async fn competition_detail(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(competition_id): Path<String>,
) -> Result<Json<CompetitionDetail>, AppError> {
    let detail = state
        .competition_service
        .competition_detail(&caller.user_id, &competition_id)
        .await?;
    Ok(Json(detail))
}

/// HTTP handler for the live duel stream
///
/// GET /api/competitions/:competition_id/stream
/// Participants only; stays open until the client disconnects
#[instrument(name = "competition_stream", skip(state))]
pub async fn competition_stream(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(competition_id): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let competition = state
        .competition_service
        .participant_competition(&caller.user_id, &competition_id)
        .await?;

    let subscription = state.hub.subscribe_competition(&competition.id);
    info!(
        competition_id = %competition.id,
        user_id = %caller.user_id,
        viewers = state.hub.competition_subscribers(&competition.id),
        "Competition stream opened"
    );

    Ok(sse_response(subscription, &state.stream_config))
}

/// HTTP handler for ending a duel
///
/// POST /api/competitions/:competition_id/end
/// Returns final scores and the winner (null on a tie)
#[instrument(name = "end_competition", skip(state))]
pub async fn end_competition(
    State(state): State<AppState>,
    Extension(caller): Extension<Caller>,
    Path(competition_id): Path<String>,
) -> Result<Json<EndResponse>, AppError> {
    let result = state
        .competition_service
        .end_competition(&caller.user_id, &competition_id)
        .await?;

    Ok(Json(EndResponse {
        message: "Competition ended!".to_string(),
        result,
    }))
}
