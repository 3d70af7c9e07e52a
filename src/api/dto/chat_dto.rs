//! Chat session DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::{ChatMessage, ChatSession, SessionRewards};

/// Request body for `POST /chat/sessions`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct StartSessionRequest {
    /// Wallet that owns the session.
    pub wallet: String,
}

/// Request body for `POST /chat/sessions/{id}/messages`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct SendMessageRequest {
    /// User message text.
    pub message: String,
}

/// Request body for `POST /rewards/estimate`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct EstimateRewardsRequest {
    /// Conversation to price.
    pub messages: Vec<ChatMessage>,
}

/// A chat session with its current reward estimate.
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionView {
    /// Session identifier.
    pub id: uuid::Uuid,
    /// Owning wallet.
    pub wallet: String,
    /// Conversation so far.
    pub messages: Vec<ChatMessage>,
    /// Start time.
    pub started_at: DateTime<Utc>,
    /// Session length in seconds.
    pub duration_secs: u64,
    /// A reply is in flight.
    pub awaiting_reply: bool,
    /// Current estimate.
    pub rewards: SessionRewards,
}

impl SessionView {
    /// Builds the view from a session snapshot.
    #[must_use]
    pub fn new(session: ChatSession, rewards: SessionRewards) -> Self {
        Self {
            id: session.id,
            wallet: session.wallet.as_str().to_string(),
            duration_secs: session.duration_secs(Utc::now()),
            started_at: session.started_at,
            awaiting_reply: session.awaiting_reply,
            messages: session.messages,
            rewards,
        }
    }
}
