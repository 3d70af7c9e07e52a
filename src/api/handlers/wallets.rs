//! Wallet handlers: connect, disconnect and account reads.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{CanSubmitResponse, ConnectWalletRequest};
use crate::app_state::AppState;
use crate::client::chain::{ChatStats, ReferralRewards, SubscriptionStatus, UserStats};
use crate::domain::WalletAddress;
use crate::error::{ErrorResponse, GatewayError};
use crate::service::wallet_service::{ConnectOutcome, DisconnectSummary, WalletSession};

/// `POST /wallets/connect` — Connect a wallet.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or
/// [`GatewayError::UnsupportedChain`].
#[utoipa::path(
    post,
    path = "/api/v1/wallets/connect",
    tag = "Wallets",
    summary = "Connect a wallet",
    description = "Registers the wallet for polling, upserts its referral user and applies the referral code if one is given. Only Polygon (137) and Polygon Amoy (80002) are accepted.",
    request_body = ConnectWalletRequest,
    responses(
        (status = 200, description = "Wallet connected", body = ConnectOutcome),
        (status = 400, description = "Invalid address or unsupported chain", body = ErrorResponse),
    )
)]
pub async fn connect_wallet(
    State(state): State<AppState>,
    Json(req): Json<ConnectWalletRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&req.address)?;
    let outcome = state
        .wallets
        .connect(address, req.chain_id, req.referral_code.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// `POST /wallets/{address}/disconnect` — Disconnect a wallet.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`].
#[utoipa::path(
    post,
    path = "/api/v1/wallets/{address}/disconnect",
    tag = "Wallets",
    summary = "Disconnect a wallet",
    description = "Drops the cached account state, cached prompt submissions, open chat sessions and tracked transactions of the wallet.",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Wallet disconnected", body = DisconnectSummary),
        (status = 409, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn disconnect_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.wallets.disconnect(&address).await?))
}

/// `GET /wallets/{address}` — Cached wallet session.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`].
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{address}",
    tag = "Wallets",
    summary = "Get a connected wallet",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Wallet session", body = WalletSession),
        (status = 409, description = "Wallet not connected", body = ErrorResponse),
    )
)]
pub async fn get_wallet(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.wallets.get(&address).await?))
}

/// `GET /wallets/{address}/stats` — Live `getUserStats`.
///
/// # Errors
///
/// Returns [`GatewayError::WalletNotConnected`] or an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{address}/stats",
    tag = "Wallets",
    summary = "Read user statistics",
    description = "Reads `getUserStats` from the contract and refreshes the cached copy.",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "User statistics", body = UserStats),
        (status = 409, description = "Wallet not connected", body = ErrorResponse),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn wallet_stats(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.wallets.refresh_stats(&address).await?))
}

/// `GET /wallets/{address}/can-submit` — Live `canSubmit`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{address}/can-submit",
    tag = "Wallets",
    summary = "Check submission eligibility",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Eligibility", body = CanSubmitResponse),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn can_submit(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    let can_submit = state.chain.can_submit(address.to_alloy()?).await?;
    Ok(Json(CanSubmitResponse {
        address: address.as_str().to_string(),
        can_submit,
    }))
}

/// `GET /wallets/{address}/chat-stats` — Live `getUserChatStats`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{address}/chat-stats",
    tag = "Wallets",
    summary = "Read chat statistics",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Chat statistics", body = ChatStats),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn chat_stats(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.chain.chat_stats(address.to_alloy()?).await?))
}

/// `GET /wallets/{address}/referral-rewards` — Live `getReferralStats`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{address}/referral-rewards",
    tag = "Wallets",
    summary = "Read on-chain referral rewards",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Referral rewards", body = ReferralRewards),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn referral_rewards(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.chain.referral_rewards(address.to_alloy()?).await?))
}

/// `GET /wallets/{address}/subscription` — Live `getSubscriptionStatus`.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or an upstream error.
#[utoipa::path(
    get,
    path = "/api/v1/wallets/{address}/subscription",
    tag = "Wallets",
    summary = "Read subscription status",
    description = "The subscription cost is a third of last month's earnings.",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "Subscription status", body = SubscriptionStatus),
        (status = 502, description = "RPC failure", body = ErrorResponse),
    )
)]
pub async fn subscription(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.chain.subscription_status(address.to_alloy()?).await?))
}

/// Wallet routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/wallets/connect", post(connect_wallet))
        .route("/wallets/{address}", get(get_wallet))
        .route("/wallets/{address}/disconnect", post(disconnect_wallet))
        .route("/wallets/{address}/stats", get(wallet_stats))
        .route("/wallets/{address}/can-submit", get(can_submit))
        .route("/wallets/{address}/chat-stats", get(chat_stats))
        .route("/wallets/{address}/referral-rewards", get(referral_rewards))
        .route("/wallets/{address}/subscription", get(subscription))
}
