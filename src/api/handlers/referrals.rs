//! Referral bookkeeping handlers.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::api::dto::{
    CreateUserRequest, PayBonusRequest, PayBonusResponse, TrackReferralRequest,
    TrackReferralResponse,
};
use crate::app_state::AppState;
use crate::domain::WalletAddress;
use crate::error::{ErrorResponse, GatewayError};
use crate::persistence::{ReferralRow, UserRow};
use crate::service::referral_service::ReferralStats;

/// `POST /referrals/users` — Create or refresh a referral user.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or a persistence error.
#[utoipa::path(
    post,
    path = "/api/v1/referrals/users",
    tag = "Referrals",
    summary = "Create a referral user",
    description = "Upserts the user; the referral code is the first six hex characters of the address, uppercased.",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User stored", body = UserRow),
        (status = 400, description = "Invalid address", body = ErrorResponse),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&req.address)?;
    let user = state.referrals.create_user(&address).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// `GET /referrals/users/{address}` — Look a user up by address.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/referrals/users/{address}",
    tag = "Referrals",
    summary = "Get a referral user",
    params(("address" = String, Path, description = "Wallet address")),
    responses(
        (status = 200, description = "User", body = UserRow),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.referrals.get_user(&address).await?))
}

/// `GET /referrals/codes/{code}` — Look a user up by referral code.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/referrals/codes/{code}",
    tag = "Referrals",
    summary = "Resolve a referral code",
    params(("code" = String, Path, description = "Referral code, case-insensitive")),
    responses(
        (status = 200, description = "Code owner", body = UserRow),
        (status = 404, description = "Unknown code", body = ErrorResponse),
    )
)]
pub async fn get_user_by_code(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    Ok(Json(state.referrals.get_user_by_referral_code(&code).await?))
}

/// `POST /referrals` — Record a referral.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidAddress`] or a persistence error.
/// Rejections come back as `tracked: false` with a reason.
#[utoipa::path(
    post,
    path = "/api/v1/referrals",
    tag = "Referrals",
    summary = "Track a referral",
    description = "Unknown codes, self-referrals and already-referred wallets are reported with `tracked: false`.",
    request_body = TrackReferralRequest,
    responses(
        (status = 200, description = "Outcome", body = TrackReferralResponse),
        (status = 400, description = "Invalid address", body = ErrorResponse),
    )
)]
pub async fn track_referral(
    State(state): State<AppState>,
    Json(req): Json<TrackReferralRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let referee = WalletAddress::parse(&req.referee)?;
    let response = match state.referrals.track_referral(&referee, &req.referral_code).await? {
        Ok(referral) => TrackReferralResponse {
            tracked: true,
            referral: Some(referral),
            reason: None,
        },
        Err(reason) => TrackReferralResponse {
            tracked: false,
            referral: None,
            reason: Some(reason),
        },
    };
    Ok(Json(response))
}

/// `GET /referrals/{referee}` — The referral recorded for a wallet.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/referrals/{referee}",
    tag = "Referrals",
    summary = "Get referral info",
    params(("referee" = String, Path, description = "Referred wallet")),
    responses(
        (status = 200, description = "Referral", body = ReferralRow),
        (status = 404, description = "Not referred", body = ErrorResponse),
    )
)]
pub async fn get_referral(
    State(state): State<AppState>,
    Path(referee): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let referee = WalletAddress::parse(&referee)?;
    Ok(Json(state.referrals.get_referral_info(&referee).await?))
}

/// `POST /referrals/payments` — Record a referral bonus.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for a negative amount, or a
/// persistence error.
#[utoipa::path(
    post,
    path = "/api/v1/referrals/payments",
    tag = "Referrals",
    summary = "Pay a referral bonus",
    description = "Adds the bonus to the referrer's earnings. Wallets without a referral yield `paid: false`.",
    request_body = PayBonusRequest,
    responses(
        (status = 200, description = "Outcome", body = PayBonusResponse),
        (status = 400, description = "Invalid amount or address", body = ErrorResponse),
    )
)]
pub async fn pay_bonus(
    State(state): State<AppState>,
    Json(req): Json<PayBonusRequest>,
) -> Result<impl IntoResponse, GatewayError> {
    let referee = WalletAddress::parse(&req.referee)?;
    let payment = state
        .referrals
        .pay_referral_bonus(
            &referee,
            &req.prompt_submission_id,
            req.bonus_amount,
            req.transaction_hash,
        )
        .await?;
    Ok(Json(PayBonusResponse {
        paid: payment.is_some(),
        payment,
    }))
}

/// `GET /referrals/stats/{address}` — Referrer summary.
///
/// # Errors
///
/// Returns [`GatewayError::NotFound`].
#[utoipa::path(
    get,
    path = "/api/v1/referrals/stats/{address}",
    tag = "Referrals",
    summary = "Referral statistics",
    params(("address" = String, Path, description = "Referrer wallet")),
    responses(
        (status = 200, description = "Summary, referred users newest first", body = ReferralStats),
        (status = 404, description = "Not found", body = ErrorResponse),
    )
)]
pub async fn referral_stats(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Result<impl IntoResponse, GatewayError> {
    let address = WalletAddress::parse(&address)?;
    Ok(Json(state.referrals.get_referral_stats(&address).await?))
}

/// Referral routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/referrals", post(track_referral))
        .route("/referrals/users", post(create_user))
        .route("/referrals/users/{address}", get(get_user))
        .route("/referrals/codes/{code}", get(get_user_by_code))
        .route("/referrals/payments", post(pay_bonus))
        .route("/referrals/stats/{address}", get(referral_stats))
        .route("/referrals/{referee}", get(get_referral))
}
