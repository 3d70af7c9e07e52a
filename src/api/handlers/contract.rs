//! Contract handlers: cached statistics, prompt reads and the
//! argument-less write transactions.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::app_state::AppState;
use crate::client::UnsignedTx;
use crate::client::chain::OnChainPrompt;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::contract_monitor::ContractSnapshot;

/// `GET /contract/stats` — Total submissions and contract balance.
///
/// # Errors
///
/// Returns an upstream error when nothing is cached and the live read
/// fails.
#[utoipa::path(
    get,
    path = "/api/v1/contract/stats",
    tag = "Contract",
    summary = "Contract statistics",
    description = "Served from the 30 s poller cache; read live when the cache is still empty.",
    responses(
        (status = 200, description = "Statistics", body = ContractSnapshot),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn contract_stats(State(state): State<AppState>) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.monitor.contract_stats().await?))
}

/// `GET /contract/prompts/{prompt_id}` — Live `getPrompt`.
///
/// # Errors
///
/// Returns an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/contract/prompts/{prompt_id}",
    tag = "Contract",
    summary = "Read an on-chain prompt",
    params(("prompt_id" = u64, Path, description = "Contract-side prompt id")),
    responses(
        (status = 200, description = "Prompt record", body = OnChainPrompt),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn get_onchain_prompt(
    State(state): State<AppState>,
    Path(prompt_id): Path<u64>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.chain.prompt(prompt_id).await?))
}

/// `POST /contract/claim-referral-rewards` — Build `claimReferralRewards()`.
#[utoipa::path(
    post,
    path = "/api/v1/contract/claim-referral-rewards",
    tag = "Contract",
    summary = "Build a referral claim transaction",
    responses(
        (status = 200, description = "Unsigned transaction", body = UnsignedTx),
    )
)]
pub async fn claim_referral_rewards(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chain.claim_referral_rewards_tx())
}

/// `POST /contract/pay-subscription` — Build `paySubscription()`.
#[utoipa::path(
    post,
    path = "/api/v1/contract/pay-subscription",
    tag = "Contract",
    summary = "Build a subscription payment transaction",
    responses(
        (status = 200, description = "Unsigned transaction", body = UnsignedTx),
    )
)]
pub async fn pay_subscription(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.chain.pay_subscription_tx())
}

/// Contract routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/contract/stats", get(contract_stats))
        .route("/contract/prompts/{prompt_id}", get(get_onchain_prompt))
        .route("/contract/claim-referral-rewards", post(claim_referral_rewards))
        .route("/contract/pay-subscription", post(pay_subscription))
}
