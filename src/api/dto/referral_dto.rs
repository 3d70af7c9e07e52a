//! Referral bookkeeping DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::persistence::{ReferralPaymentRow, ReferralRow};
use crate::service::referral_service::ReferralRejection;

/// Request body for `POST /referrals/users`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    /// Wallet address.
    pub address: String,
}

/// Request body for `POST /referrals`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackReferralRequest {
    /// Referred wallet.
    pub referee: String,
    /// Referrer's code.
    pub referral_code: String,
}

/// Response body for `POST /referrals`.
#[derive(Debug, Serialize, ToSchema)]
pub struct TrackReferralResponse {
    /// Whether the referral was recorded.
    pub tracked: bool,
    /// The stored referral.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referral: Option<ReferralRow>,
    /// Why it was not recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<ReferralRejection>,
}

/// Request body for `POST /referrals/payments`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PayBonusRequest {
    /// Referred wallet whose submission earned the bonus.
    pub referee: String,
    /// Submission that triggered the bonus.
    pub prompt_submission_id: String,
    /// Bonus in POOL.
    pub bonus_amount: f64,
    /// Payout transaction, if already sent.
    #[serde(default)]
    pub transaction_hash: Option<String>,
}

/// Response body for `POST /referrals/payments`.
#[derive(Debug, Serialize, ToSchema)]
pub struct PayBonusResponse {
    /// Whether a payment was recorded.
    pub paid: bool,
    /// The stored payment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<ReferralPaymentRow>,
}
