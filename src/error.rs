//! Gateway error types with HTTP status code mapping.
//!
//! [`GatewayError`] is the central error type for the gateway. Each variant
//! maps to a specific HTTP status code and structured JSON error response.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use utoipa::ToSchema;

use crate::client::chain::ChainError;
use crate::client::groq::LlmError;
use crate::client::pinata::PinError;

/// Structured JSON error response body.
///
/// All error responses follow this shape:
/// ```json
/// {
///   "error": {
///     "code": 1001,
///     "message": "invalid request: prompt content must be at least 20 characters",
///     "details": null
///   }
/// }
/// ```
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    /// Structured error payload.
    pub error: ErrorBody,
}

/// Inner error body with numeric code and human-readable message.
#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorBody {
    /// Numeric error code (see code ranges below).
    pub code: u32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional details.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Server-side error enum with HTTP status code mapping.
///
/// # Error Code Ranges
///
/// | Range     | Category        | HTTP Status                  |
/// |-----------|-----------------|------------------------------|
/// | 1000–1999 | Validation      | 400 Bad Request              |
/// | 2000–2999 | State/Not Found | 404 Not Found / 409 Conflict |
/// | 3000–3999 | Server          | 500 Internal Server Error    |
/// | 5000–5999 | Upstream        | 502 Bad Gateway              |
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Request validation failed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Malformed wallet address.
    #[error("invalid wallet address: {0}")]
    InvalidAddress(String),

    /// Wallet is connected to an unsupported chain.
    #[error("unsupported chain id {0}; switch to Polygon")]
    UnsupportedChain(u64),

    /// Operation requires a connected wallet.
    #[error("wallet not connected: {0}")]
    WalletNotConnected(String),

    /// Chat session not found.
    #[error("chat session not found: {0}")]
    SessionNotFound(uuid::Uuid),

    /// Cached prompt submission not found.
    #[error("prompt not found: {0}")]
    PromptNotFound(uuid::Uuid),

    /// Tracked transaction not found.
    #[error("transaction not found: {0}")]
    TransactionNotFound(String),

    /// Referral user or record not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request conflicts with current state.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Not enough chat messages to claim a session reward.
    #[error("Need at least {required} messages to claim rewards! Currently: {current}")]
    NotEnoughMessages {
        /// Minimum number of user messages.
        required: usize,
        /// User messages in the session so far.
        current: usize,
    },

    /// An integration is missing its credentials.
    #[error("{0} not configured")]
    NotConfigured(&'static str),

    /// An external service failed.
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Persistence layer failure.
    #[error("persistence error: {0}")]
    PersistenceError(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Returns the numeric error code for this variant.
    #[must_use]
    pub const fn error_code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => 1001,
            Self::InvalidAddress(_) => 1002,
            Self::UnsupportedChain(_) => 1003,
            Self::NotEnoughMessages { .. } => 1004,
            Self::SessionNotFound(_) => 2001,
            Self::PromptNotFound(_) => 2002,
            Self::TransactionNotFound(_) => 2003,
            Self::NotFound(_) => 2004,
            Self::WalletNotConnected(_) => 2005,
            Self::Conflict(_) => 2009,
            Self::Internal(_) => 3000,
            Self::PersistenceError(_) => 3001,
            Self::NotConfigured(_) => 3002,
            Self::Upstream(_) => 5001,
        }
    }

    /// Returns the HTTP status code for this variant.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidAddress(_)
            | Self::UnsupportedChain(_)
            | Self::NotEnoughMessages { .. } => StatusCode::BAD_REQUEST,
            Self::SessionNotFound(_)
            | Self::PromptNotFound(_)
            | Self::TransactionNotFound(_)
            | Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::WalletNotConnected(_) | Self::Conflict(_) => StatusCode::CONFLICT,
            Self::PersistenceError(_) | Self::Internal(_) | Self::NotConfigured(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl From<LlmError> for GatewayError {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => Self::NotConfigured("AI service"),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<PinError> for GatewayError {
    fn from(err: PinError) -> Self {
        match err {
            PinError::NotConfigured => Self::NotConfigured("IPFS service"),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<ChainError> for GatewayError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::InvalidAddress(addr) => Self::InvalidAddress(addr),
            other => Self::Upstream(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for GatewayError {
    fn from(err: sqlx::Error) -> Self {
        Self::PersistenceError(err.to_string())
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        }
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.error_code(),
                message: self.to_string(),
                details: None,
            },
        };
        let mut response = axum::Json(body).into_response();
        *response.status_mut() = status;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_map_to_bad_request() {
        let err = GatewayError::InvalidRequest("title is required".to_string());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.error_code(), 1001);
    }

    #[test]
    fn not_enough_messages_message_matches_ui_copy() {
        let err = GatewayError::NotEnoughMessages {
            required: 5,
            current: 2,
        };
        assert_eq!(
            err.to_string(),
            "Need at least 5 messages to claim rewards! Currently: 2"
        );
    }

    #[test]
    fn upstream_errors_map_to_bad_gateway() {
        let err: GatewayError = LlmError::RequestFailed {
            status: 503,
            body: "overloaded".to_string(),
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn unconfigured_llm_maps_to_not_configured() {
        let err: GatewayError = LlmError::NotConfigured.into();
        assert_eq!(err.to_string(), "AI service not configured");
    }
}
