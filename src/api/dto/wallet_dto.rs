//! Wallet connection DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request body for `POST /wallets/connect`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectWalletRequest {
    /// Wallet address (`0x` + 40 hex characters).
    pub address: String,
    /// Chain the wallet is connected to.
    pub chain_id: u64,
    /// Referral code from the invite link, if any.
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Response body for `GET /wallets/{address}/can-submit`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CanSubmitResponse {
    /// Wallet address.
    pub address: String,
    /// Whether the contract currently accepts a submission.
    pub can_submit: bool,
}
