//! Transient user-facing notifications.
//!
//! Every noteworthy outcome (a pinned prompt, a settled transaction, a
//! failed chat reply) emits a [`Notification`] through the
//! [`super::EventBus`]. WebSocket clients render them as toasts.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::WalletAddress;

/// Default time a notification stays visible, in milliseconds.
pub const DEFAULT_DURATION_MS: u64 = 5_000;

/// Visibility of failures the user must act on, in milliseconds.
pub const FAILURE_DURATION_MS: u64 = 10_000;

/// Visual category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// Operation succeeded.
    Success,
    /// Operation failed.
    Error,
    /// Neutral information.
    Info,
    /// Operation in progress; never auto-dismissed.
    Loading,
}

/// A toast-style notification.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Notification {
    /// Notification identifier, usable by clients to dismiss it.
    pub id: uuid::Uuid,
    /// Visual category.
    pub kind: NotificationKind,
    /// Short headline.
    pub title: String,
    /// Optional body text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Related transaction hash, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
    /// Wallet this notification concerns. `None` means broadcast to all.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub wallet: Option<WalletAddress>,
    /// Auto-dismiss delay in milliseconds. `None` for loading toasts.
    pub duration_ms: Option<u64>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Creates a notification with the default duration for its kind.
    #[must_use]
    pub fn new(kind: NotificationKind, title: impl Into<String>) -> Self {
        let duration_ms = match kind {
            NotificationKind::Loading => None,
            _ => Some(DEFAULT_DURATION_MS),
        };
        Self {
            id: uuid::Uuid::new_v4(),
            kind,
            title: title.into(),
            message: None,
            tx_hash: None,
            wallet: None,
            duration_ms,
            created_at: Utc::now(),
        }
    }

    /// Shorthand for a success notification.
    #[must_use]
    pub fn success(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, title)
    }

    /// Shorthand for an error notification.
    #[must_use]
    pub fn error(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, title)
    }

    /// Shorthand for an info notification.
    #[must_use]
    pub fn info(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, title)
    }

    /// Shorthand for a loading notification.
    #[must_use]
    pub fn loading(title: impl Into<String>) -> Self {
        Self::new(NotificationKind::Loading, title)
    }

    /// Sets the body text.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Targets the notification at one wallet.
    #[must_use]
    pub fn for_wallet(mut self, wallet: &WalletAddress) -> Self {
        self.wallet = Some(wallet.clone());
        self
    }

    /// Attaches a transaction hash.
    #[must_use]
    pub fn with_tx_hash(mut self, tx_hash: impl Into<String>) -> Self {
        self.tx_hash = Some(tx_hash.into());
        self
    }

    /// Overrides the auto-dismiss delay. Ignored for loading toasts.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        if self.kind != NotificationKind::Loading {
            self.duration_ms = Some(duration_ms);
        }
        self
    }

    /// Returns `true` when the notification has outlived its duration.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.duration_ms.is_some_and(|ms| {
            let elapsed = now.signed_duration_since(self.created_at);
            elapsed.num_milliseconds() >= i64::try_from(ms).unwrap_or(i64::MAX)
        })
    }
}
