//! Transaction tracking handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::TrackTransactionRequest;
use crate::app_state::AppState;
use crate::domain::{TrackedTransaction, WalletAddress};
use crate::error::{ErrorResponse, GatewayError};

/// `POST /transactions` — Track a sent transaction.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed hash or
/// [`GatewayError::InvalidAddress`].
#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    tag = "Transactions",
    summary = "Track a transaction",
    description = "The receipt poller checks every 5 s and moves the transaction to `success` or `failed`.",
    request_body = TrackTransactionRequest,
    responses(
        (status = 202, description = "Tracking started", body = TrackedTransaction),
        (status = 400, description = "Malformed hash or address", body = ErrorResponse),
    )
)]
pub async fn track_transaction(
    State(state): State<AppState>,
    Json(req): Json<TrackTransactionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = WalletAddress::parse(&req.wallet)?;
    let tracked = state.monitor.track(&req.hash, req.kind, wallet).await?;
    Ok((StatusCode::ACCEPTED, Json(tracked)))
}

/// `GET /transactions/{hash}` — Tracked transaction status.
///
/// # Errors
///
/// Returns [`GatewayError::TransactionNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/transactions/{hash}",
    tag = "Transactions",
    summary = "Get a tracked transaction",
    params(("hash" = String, Path, description = "Transaction hash")),
    responses(
        (status = 200, description = "Transaction", body = TrackedTransaction),
        (status = 404, description = "Not tracked", body = ErrorResponse),
    )
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.monitor.transaction(&hash).await?))
}

/// Transaction routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/transactions", post(track_transaction))
        .route("/transactions/{hash}", get(get_transaction))
}
