//! Prompt submission DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::PromptCategory;

/// Request body for `POST /prompts`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitPromptRequest {
    /// Prompt title.
    pub title: String,
    /// Prompt body, at least 20 characters.
    pub content: String,
    /// Category (0–5).
    #[schema(value_type = u8)]
    pub category: PromptCategory,
    /// Submitting wallet.
    pub author: String,
}

/// Query parameters for `GET /prompts`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPromptsQuery {
    /// Wallet whose submissions to list.
    pub wallet: String,
}

/// Query parameters for `GET /prompts/estimate`.
#[derive(Debug, Deserialize, IntoParams)]
pub struct EstimateQuery {
    /// Prompt length in characters.
    pub length: usize,
    /// Category (0–5).
    #[param(value_type = u8)]
    pub category: PromptCategory,
    /// Submitting wallet.
    pub wallet: String,
}

/// Request body for `POST /prompts/{id}/transaction`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct AttachTransactionRequest {
    /// Hash of the signed `submitPrompt` transaction.
    pub tx_hash: String,
}

/// Request body for `POST /prompts/{id}/refresh`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshPromptRequest {
    /// Contract-side prompt id.
    pub prompt_id: u64,
}

/// A category with its label, for `GET /config/categories`.
#[derive(Debug, Serialize, ToSchema)]
pub struct CategoryInfo {
    /// On-chain discriminant.
    pub id: u8,
    /// Display label.
    pub label: &'static str,
}
