//! Database models for referral bookkeeping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::GatewayError;

/// A row from the `users` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Lowercase wallet address.
    pub address: String,
    /// Six-character referral code.
    pub referral_code: String,
    /// Users this wallet referred.
    pub total_referrals: i64,
    /// Referral bonuses earned.
    pub total_earnings: f64,
    /// First seen.
    pub created_at: DateTime<Utc>,
    /// Last counter update.
    pub updated_at: DateTime<Utc>,
}

/// Lifecycle of a referral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReferralStatus {
    /// Recorded, not yet confirmed.
    Pending,
    /// Confirmed at tracking time.
    Confirmed,
    /// Bonus paid.
    Paid,
}

impl ReferralStatus {
    /// Column value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Paid => "paid",
        }
    }
}

impl std::str::FromStr for ReferralStatus {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "paid" => Ok(Self::Paid),
            other => Err(GatewayError::PersistenceError(format!(
                "unknown referral status: {other}"
            ))),
        }
    }
}

/// A row from the `referrals` table. One per referee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferralRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Referred wallet.
    pub referee_address: String,
    /// Referring wallet.
    pub referrer_address: String,
    /// Code the referee signed up with.
    pub referrer_code: String,
    /// Current status.
    pub status: ReferralStatus,
    /// Bonus recorded on the referral itself.
    pub bonus_amount: f64,
    /// When the referral was tracked.
    pub created_at: DateTime<Utc>,
}

/// A row from the `referral_payments` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ReferralPaymentRow {
    /// Auto-increment row ID.
    pub id: i64,
    /// Wallet receiving the bonus.
    pub referrer_address: String,
    /// Wallet whose submission triggered it.
    pub referee_address: String,
    /// Submission the bonus is for.
    pub prompt_submission_id: String,
    /// Bonus paid.
    pub bonus_amount: f64,
    /// Payout transaction, if known.
    pub transaction_hash: Option<String>,
    /// Payment time.
    pub paid_at: DateTime<Utc>,
}

/// A referee as listed in a referrer's stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ReferredUser {
    /// Referred wallet.
    pub referee_address: String,
    /// When the referral was tracked.
    pub created_at: DateTime<Utc>,
}

/// Input for a new referral.
#[derive(Debug, Clone)]
pub struct NewReferral {
    /// Referred wallet.
    pub referee_address: String,
    /// Referring wallet.
    pub referrer_address: String,
    /// Code used.
    pub referrer_code: String,
    /// Initial status.
    pub status: ReferralStatus,
}

/// Input for a new referral payment.
#[derive(Debug, Clone)]
pub struct NewReferralPayment {
    /// Wallet receiving the bonus.
    pub referrer_address: String,
    /// Wallet whose submission triggered it.
    pub referee_address: String,
    /// Submission the bonus is for.
    pub prompt_submission_id: String,
    /// Bonus paid.
    pub bonus_amount: f64,
    /// Payout transaction, if known.
    pub transaction_hash: Option<String>,
}
