//! Domain layer: core types, in-memory stores, and the notification bus.
//!
//! This module contains the server-side domain model: wallet identity,
//! prompt submissions and their per-wallet cache, chat sessions and the
//! reward estimator, tracked transactions, and the event bus that carries
//! notifications to WebSocket clients.

pub mod chat;
pub mod event_bus;
pub mod notification;
pub mod prompt;
pub mod prompt_cache;
pub mod rewards;
pub mod session_registry;
pub mod transaction;
pub mod wallet_address;

pub use chat::{ChatMessage, ChatRole, ChatSession};
pub use event_bus::EventBus;
pub use notification::{Notification, NotificationKind};
pub use prompt::{
    CachedPrompt, OnChainFields, PromptCategory, PromptDraft, SubmissionStatus, Tier,
};
pub use prompt_cache::PromptCache;
pub use rewards::{GasAssumptions, SessionRewards};
pub use session_registry::SessionRegistry;
pub use transaction::{TrackedTransaction, TransactionTracker, TxKind, TxStatus};
pub use wallet_address::WalletAddress;
