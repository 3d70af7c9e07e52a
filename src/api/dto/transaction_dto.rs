//! Transaction tracking DTOs.

use serde::Deserialize;
use utoipa::ToSchema;

use crate::domain::TxKind;

/// Request body for `POST /transactions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackTransactionRequest {
    /// Transaction hash (`0x` + 64 hex characters).
    pub hash: String,
    /// Contract function the transaction called.
    pub kind: TxKind,
    /// Sending wallet.
    pub wallet: String,
}
