//! Chat session handlers and the standalone reward estimator.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    EstimateRewardsRequest, SendMessageRequest, SessionView, StartSessionRequest,
};
use crate::app_state::AppState;
use crate::domain::rewards;
use crate::domain::{SessionRewards, WalletAddress};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::chat_service::{ChatTurn, SessionClaim};

/// `POST /chat/sessions` — Start a session.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`].
#[utoipa::path(
    post,
    path = "/api/v1/chat/sessions",
    tag = "Chat",
    summary = "Start a chat session",
    description = "Opens a session seeded with Pool AI's greeting.",
    request_body = StartSessionRequest,
    responses(
        (status = 201, description = "Session started", body = SessionView),
        (status = 409, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn start_session(
    State(state): State<AppState>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = WalletAddress::parse(&req.wallet)?;
    let session = state.chat.start(wallet).await?;
    let estimate = rewards::estimate(&session.messages, state.chat.gas());
    Ok((StatusCode::CREATED, Json(SessionView::new(session, estimate))))
}

/// `GET /chat/sessions/{id}` — Session snapshot.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/chat/sessions/{id}",
    tag = "Chat",
    summary = "Get a chat session",
    params(("id" = uuid::Uuid, Path, description = "Session UUID")),
    responses(
        (status = 200, description = "Session", body = SessionView),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    let session = state.chat.get(id).await?;
    let estimate = rewards::estimate(&session.messages, state.chat.gas());
    Ok(Json(SessionView::new(session, estimate)))
}

/// `POST /chat/sessions/{id}/messages` — Send a message.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for blank input,
/// [`GatewayError::Conflict`] while a reply is pending, or
/// [`GatewayError::SessionNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/chat/sessions/{id}/messages",
    tag = "Chat",
    summary = "Send a chat message",
    description = "Appends the message, asks Pool AI for a reply (an apology is appended if the provider fails) and returns both messages with the updated estimate.",
    params(("id" = uuid::Uuid, Path, description = "Session UUID")),
    request_body = SendMessageRequest,
    responses(
        (status = 200, description = "Turn completed", body = ChatTurn),
        (status = 400, description = "Message is required", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 409, description = "Reply pending", body = ErrorResponse),
    )
)]
pub async fn send_message(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<SendMessageRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.chat.send(id, &req.message).await?))
}

/// `GET /chat/sessions/{id}/rewards` — Current estimate.
///
/// # Errors
///
/// Returns [`GatewayError::SessionNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/chat/sessions/{id}/rewards",
    tag = "Chat",
    summary = "Get the session estimate",
    params(("id" = uuid::Uuid, Path, description = "Session UUID")),
    responses(
        (status = 200, description = "Estimate", body = SessionRewards),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn session_rewards(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.chat.rewards(id).await?))
}

/// `POST /chat/sessions/{id}/end` — Claim and close the session.
///
/// # Errors
///
/// Returns [`GatewayError::NotEnoughMessages`] below five user messages,
/// [`GatewayError::WalletNotConnected`] or
/// [`GatewayError::SessionNotFound`].
#[utoipa::path(
    post,
    path = "/api/v1/chat/sessions/{id}/end",
    tag = "Chat",
    summary = "End a chat session",
    description = "Pins the transcript and returns the `submitChatSession` transaction for the wallet to sign. Requires at least five user messages.",
    params(("id" = uuid::Uuid, Path, description = "Session UUID")),
    responses(
        (status = 200, description = "Session claimed", body = SessionClaim),
        (status = 400, description = "Not enough messages", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn end_session(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.chat.end(id).await?))
}

/// `POST /rewards/estimate` — Price an arbitrary conversation.
#[utoipa::path(
    post,
    path = "/api/v1/rewards/estimate",
    tag = "Chat",
    summary = "Estimate conversation rewards",
    request_body = EstimateRewardsRequest,
    responses(
        (status = 200, description = "Estimate", body = SessionRewards),
    )
)]
pub async fn estimate_rewards(
    State(state): State<AppState>,
    Json(req): Json<EstimateRewardsRequest>,
) -> impl IntoResponse {
    Json(rewards::estimate(&req.messages, state.chat.gas()))
}

/// Chat routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/chat/sessions", post(start_session))
        .route("/chat/sessions/{id}", get(get_session))
        .route("/chat/sessions/{id}/messages", post(send_message))
        .route("/chat/sessions/{id}/rewards", get(session_rewards))
        .route("/chat/sessions/{id}/end", post(end_session))
        .route("/rewards/estimate", post(estimate_rewards))
}
