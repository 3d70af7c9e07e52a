//! Chat messages and sessions with Pool AI.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::WalletAddress;

/// Greeting every session starts with.
pub const GREETING: &str = "Hi! I'm Pool, PromptPool's AI. Ask me anything and earn POOL tokens for quality conversations! 🌊💰";

/// Reply appended when the LLM call fails.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Minimum user messages before a session reward can be claimed.
pub const MIN_CLAIM_MESSAGES: usize = 5;

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The wallet owner.
    User,
    /// Pool AI.
    Assistant,
    /// System prompt; only ever sent upstream, never stored.
    System,
}

impl ChatRole {
    /// Wire name used by OpenAI-compatible APIs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChatMessage {
    /// Who wrote it.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Unix timestamp in milliseconds.
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatMessage {
    /// Creates a message stamped with the current time.
    #[must_use]
    pub fn now(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now().timestamp_millis(),
        }
    }
}

/// An in-memory chat session for one wallet.
///
/// Lives in the [`super::SessionRegistry`] until the session is ended or
/// the wallet disconnects.
#[derive(Debug, Clone)]
pub struct ChatSession {
    /// Session identifier.
    pub id: uuid::Uuid,
    /// Wallet that owns the session.
    pub wallet: WalletAddress,
    /// Conversation so far, starting with the greeting.
    pub messages: Vec<ChatMessage>,
    /// When the session started.
    pub started_at: DateTime<Utc>,
    /// A reply is in flight; further messages are rejected until it lands.
    pub awaiting_reply: bool,
}

impl ChatSession {
    /// Starts a new session seeded with the greeting.
    #[must_use]
    pub fn new(wallet: WalletAddress) -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            wallet,
            messages: vec![ChatMessage::now(ChatRole::Assistant, GREETING)],
            started_at: Utc::now(),
            awaiting_reply: false,
        }
    }

    /// Number of messages written by the user.
    #[must_use]
    pub fn user_message_count(&self) -> usize {
        self.messages
            .iter()
            .filter(|m| m.role == ChatRole::User)
            .count()
    }

    /// Whole seconds elapsed since the session started.
    #[must_use]
    pub fn duration_secs(&self, now: DateTime<Utc>) -> u64 {
        u64::try_from(now.signed_duration_since(self.started_at).num_seconds()).unwrap_or(0)
    }
}

/// Formats a duration as `m:ss`.
#[must_use]
pub fn format_session_time(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
