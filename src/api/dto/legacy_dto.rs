//! DTOs for the legacy `/api/*` endpoints.
//!
//! These keep the `{success, error}` envelope and camelCase names that
//! existing browser clients expect.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ChatMessage, ChatRole};

/// One history entry. Extra fields (ids, timestamps) are ignored.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HistoryEntry {
    /// `user` or `assistant`.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
}

impl From<HistoryEntry> for ChatMessage {
    fn from(entry: HistoryEntry) -> Self {
        Self {
            role: entry.role,
            content: entry.content,
            timestamp: 0,
        }
    }
}

/// Request body for `POST /api/chat-groq`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChatGroqRequest {
    /// User message.
    #[serde(default)]
    pub message: Option<String>,
    /// Prior conversation, oldest first.
    #[serde(default)]
    pub conversation_history: Vec<HistoryEntry>,
}

/// Success body for `POST /api/chat-groq`.
#[derive(Debug, Serialize, ToSchema)]
pub struct ChatGroqResponse {
    /// Always `true`.
    pub success: bool,
    /// Assistant reply.
    pub message: String,
    /// Provider usage statistics.
    pub usage: serde_json::Value,
}

/// Success body for `GET /api/test-groq`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TestGroqResponse {
    /// Always `true`.
    pub success: bool,
    /// Assistant reply.
    pub message: String,
    /// Raw provider response.
    pub full_response: serde_json::Value,
}

/// Request body for `POST /api/upload-to-ipfs`.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    /// Prompt title.
    #[serde(default)]
    pub title: Option<String>,
    /// Prompt body.
    #[serde(default)]
    pub content: Option<String>,
    /// Category discriminant.
    #[serde(default)]
    pub category: u8,
    /// Author address.
    #[serde(default)]
    pub author: Option<String>,
    /// Unix timestamp in milliseconds.
    #[serde(default)]
    pub submitted_at: Option<i64>,
}

/// Body for `POST /api/upload-to-ipfs`, real or demo.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    /// Always `true`.
    pub success: bool,
    /// Content hash.
    pub hash: String,
    /// Public gateway URL.
    pub url: String,
    /// The hash was simulated.
    pub is_demo: bool,
    /// Why demo mode was used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Error body shared by the legacy endpoints.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LegacyError {
    /// Always `false`.
    pub success: bool,
    /// Error headline.
    pub error: String,
    /// Provider detail, when available.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Present on upload failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_demo: Option<bool>,
}

impl LegacyError {
    /// An error with just a headline.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: error.into(),
            message: None,
            is_demo: None,
        }
    }

    /// Adds provider detail.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
