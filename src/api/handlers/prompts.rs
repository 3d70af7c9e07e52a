//! Prompt submission handlers and IPFS retrieval.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    AttachTransactionRequest, EstimateQuery, ListPromptsQuery, RefreshPromptRequest,
    SubmitPromptRequest,
};
use crate::app_state::AppState;
use crate::client::chain::RewardEstimate;
use crate::domain::{CachedPrompt, TrackedTransaction, WalletAddress};
use crate::error::{ErrorResponse, GatewayError};
use crate::service::prompt_service::SubmissionOutcome;

/// `POST /prompts` — Validate, pin and cache a prompt.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a blank title or short
/// content, or [`GatewayError::WalletNotConnected`].
#[utoipa::path(
    post,
    path = "/api/v1/prompts",
    tag = "Prompts",
    summary = "Submit a prompt",
    description = "Validates the prompt, pins it to IPFS (falling back to a demo hash), caches it as `pending` and returns the `submitPrompt` transaction for the wallet to sign.",
    request_body = SubmitPromptRequest,
    responses(
        (status = 201, description = "Prompt pinned", body = SubmissionOutcome),
        (status = 400, description = "Validation failed", body = ErrorResponse),
        (status = 409, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn submit_prompt(
    State(state): State<AppState>,
    Json(req): Json<SubmitPromptRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let author = WalletAddress::parse(&req.author)?;
    let outcome = state
        .prompts
        .submit(&req.title, &req.content, req.category, author)
        .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// `GET /prompts?wallet=` — The wallet's cached submissions.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`].
#[utoipa::path(
    get,
    path = "/api/v1/prompts",
    tag = "Prompts",
    summary = "List cached submissions",
    params(ListPromptsQuery),
    responses(
        (status = 200, description = "Submissions, newest first", body = Vec<CachedPrompt>),
        (status = 400, description = "Invalid address", body = ErrorResponse),
    )
)]
pub async fn list_prompts(
    State(state): State<AppState>,
    Query(query): Query<ListPromptsQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = WalletAddress::parse(&query.wallet)?;
    Ok(Json(state.prompts.list(&wallet).await))
}

/// `GET /prompts/{id}` — One cached submission.
///
/// # Errors
///
/// Returns [`GatewayError::PromptNotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/prompts/{id}",
    tag = "Prompts",
    summary = "Get a cached submission",
    params(("id" = uuid::Uuid, Path, description = "Submission UUID")),
    responses(
        (status = 200, description = "Submission", body = CachedPrompt),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn get_prompt(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.prompts.get(id).await?))
}

/// `POST /prompts/{id}/transaction` — Attach the signed transaction hash.
///
/// # Errors
///
/// Returns [`GatewayError::PromptNotFound`] or
/// [`GatewayError::InvalidRequest`] for a malformed hash.
#[utoipa::path(
    post,
    path = "/api/v1/prompts/{id}/transaction",
    tag = "Prompts",
    summary = "Attach a transaction",
    description = "Records the hash of the signed `submitPrompt` transaction. The receipt poller settles the submission to `confirmed` or `failed`.",
    params(("id" = uuid::Uuid, Path, description = "Submission UUID")),
    request_body = AttachTransactionRequest,
    responses(
        (status = 202, description = "Tracking started", body = TrackedTransaction),
        (status = 400, description = "Malformed hash", body = ErrorResponse),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn attach_transaction(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<AttachTransactionRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let tracked = state.prompts.attach_transaction(id, &req.tx_hash).await?;
    Ok((StatusCode::ACCEPTED, Json(tracked)))
}

/// `POST /prompts/{id}/refresh` — Copy `getPrompt` fields onto the record.
///
/// # Errors
///
/// Returns [`GatewayError::PromptNotFound`] or an upstream error.
#[utoipa::path(
    post,
    path = "/api/v1/prompts/{id}/refresh",
    tag = "Prompts",
    summary = "Refresh on-chain fields",
    params(("id" = uuid::Uuid, Path, description = "Submission UUID")),
    request_body = RefreshPromptRequest,
    responses(
        (status = 200, description = "Updated submission", body = CachedPrompt),
        (status = 404, description = "Not found", body = ErrorResponse),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn refresh_prompt(
    State(state): State<AppState>,
    Path(id): Path<uuid::Uuid>,
    Json(req): Json<RefreshPromptRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.prompts.refresh(id, req.prompt_id).await?))
}

/// `GET /prompts/estimate` — Live reward preview.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/prompts/estimate",
    tag = "Prompts",
    summary = "Estimate a prompt reward",
    description = "Reads `getRewardEstimate`. Lengths under 20 characters return a zero estimate without a contract call.",
    params(EstimateQuery),
    responses(
        (status = 200, description = "Tier and reward", body = RewardEstimate),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn estimate_prompt(
    State(state): State<AppState>,
    Query(query): Query<EstimateQuery>,
) -> Result<impl IntoResponse, GatewayError> {
    let wallet = WalletAddress::parse(&query.wallet)?;
    Ok(Json(
        state
            .prompts
            .estimate(query.length, query.category, &wallet)
            .await?,
    ))
}

/// `GET /ipfs/{hash}` — Fetch a pinned object.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a malformed hash or
/// [`GatewayError::NotFound`] when every gateway fails.
#[utoipa::path(
    get,
    path = "/api/v1/ipfs/{hash}",
    tag = "Prompts",
    summary = "Fetch from IPFS",
    description = "Tries the Pinata gateway, then ipfs.io, Cloudflare and dweb.link, 10 s each.",
    params(("hash" = String, Path, description = "CIDv0 hash (`Qm…`)")),
    responses(
        (status = 200, description = "Pinned JSON", body = serde_json::Value),
        (status = 400, description = "Malformed hash", body = ErrorResponse),
        (status = 404, description = "Every gateway failed", body = ErrorResponse),
    )
)]
pub async fn fetch_ipfs(
    State(state): State<AppState>,
    Path(hash): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.prompts.fetch_ipfs(&hash).await?))
}

/// Prompt routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/prompts", post(submit_prompt).get(list_prompts))
        .route("/prompts/estimate", get(estimate_prompt))
        .route("/prompts/{id}", get(get_prompt))
        .route("/prompts/{id}/transaction", post(attach_transaction))
        .route("/prompts/{id}/refresh", post(refresh_prompt))
        .route("/ipfs/{hash}", get(fetch_ipfs))
}
