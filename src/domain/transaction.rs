//! Tracking of wallet-signed transactions until their receipts settle.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::WalletAddress;
use crate::error::GatewayError;

/// Which contract function the transaction called.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxKind {
    /// `submitPrompt`.
    SubmitPrompt,
    /// `submitChatSession`.
    SubmitChatSession,
    /// `claimReferralRewards`.
    ClaimReferralRewards,
    /// `paySubscription`.
    PaySubscription,
}

impl TxKind {
    /// Human-readable label used in notifications.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::SubmitPrompt => "Prompt submission",
            Self::SubmitChatSession => "Chat session claim",
            Self::ClaimReferralRewards => "Referral reward claim",
            Self::PaySubscription => "Subscription payment",
        }
    }
}

/// Settlement state of a tracked transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Sent; waiting for a receipt.
    Confirming,
    /// Receipt with status 1.
    Success,
    /// Receipt with status 0.
    Failed,
}

/// A transaction the gateway is watching.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TrackedTransaction {
    /// Transaction hash, lowercase.
    pub hash: String,
    /// Called function.
    pub kind: TxKind,
    /// Sending wallet.
    #[schema(value_type = String)]
    pub wallet: WalletAddress,
    /// Cached prompt this transaction settles, if any.
    pub prompt_id: Option<uuid::Uuid>,
    /// Current status.
    pub status: TxStatus,
    /// Block the transaction was mined in.
    pub block_number: Option<u64>,
    /// When tracking started.
    pub submitted_at: DateTime<Utc>,
    /// When the receipt was observed.
    pub settled_at: Option<DateTime<Utc>>,
}

impl TrackedTransaction {
    /// `true` once the transaction has a receipt.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        self.status != TxStatus::Confirming
    }
}

/// Validates a `0x`-prefixed 32-byte transaction hash, returning it
/// lowercased.
///
/// # Errors
///
/// Returns [`GatewayError::InvalidRequest`] for anything else.
pub fn normalize_tx_hash(raw: &str) -> Result<String, GatewayError> {
    let raw = raw.trim();
    let hex = raw
        .strip_prefix("0x")
        .ok_or_else(|| GatewayError::InvalidRequest(format!("invalid tx hash: {raw}")))?;
    if hex.len() != 64 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(GatewayError::InvalidRequest(format!("invalid tx hash: {raw}")));
    }
    Ok(format!("0x{}", hex.to_ascii_lowercase()))
}

/// Seconds a settled transaction stays queryable before it is pruned.
pub const SETTLED_RETENTION_SECS: i64 = 600;

/// Registry of tracked transactions, keyed by hash.
#[derive(Debug, Default)]
pub struct TransactionTracker {
    txs: RwLock<HashMap<String, TrackedTransaction>>,
}

impl TransactionTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts tracking a transaction. Re-tracking a known hash returns
    /// the existing record unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a malformed hash.
    pub async fn track(
        &self,
        hash: &str,
        kind: TxKind,
        wallet: WalletAddress,
        prompt_id: Option<uuid::Uuid>,
    ) -> Result<TrackedTransaction, GatewayError> {
        let hash = normalize_tx_hash(hash)?;
        let mut txs = self.txs.write().await;
        let tx = txs
            .entry(hash.clone())
            .or_insert_with(|| TrackedTransaction {
                hash,
                kind,
                wallet,
                prompt_id,
                status: TxStatus::Confirming,
                block_number: None,
                submitted_at: Utc::now(),
                settled_at: None,
            });
        Ok(tx.clone())
    }

    /// Returns the tracked transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TransactionNotFound`] if the hash is unknown.
    pub async fn get(&self, hash: &str) -> Result<TrackedTransaction, GatewayError> {
        let key = normalize_tx_hash(hash)?;
        self.txs
            .read()
            .await
            .get(&key)
            .cloned()
            .ok_or_else(|| GatewayError::TransactionNotFound(hash.to_string()))
    }

    /// Hashes still waiting for a receipt.
    pub async fn pending(&self) -> Vec<TrackedTransaction> {
        self.txs
            .read()
            .await
            .values()
            .filter(|tx| !tx.is_settled())
            .cloned()
            .collect()
    }

    /// Records a receipt. Returns the updated record, or `None` if the
    /// hash is unknown or already settled.
    pub async fn settle(
        &self,
        hash: &str,
        success: bool,
        block_number: Option<u64>,
    ) -> Option<TrackedTransaction> {
        let mut txs = self.txs.write().await;
        let tx = txs.get_mut(hash)?;
        if tx.is_settled() {
            return None;
        }
        tx.status = if success {
            TxStatus::Success
        } else {
            TxStatus::Failed
        };
        tx.block_number = block_number;
        tx.settled_at = Some(Utc::now());
        Some(tx.clone())
    }

    /// Drops transactions that settled before `cutoff`. Returns how many
    /// were removed.
    pub async fn prune_settled(&self, cutoff: DateTime<Utc>) -> usize {
        let mut txs = self.txs.write().await;
        let before = txs.len();
        txs.retain(|_, tx| tx.settled_at.is_none_or(|at| at >= cutoff));
        before - txs.len()
    }

    /// Stops tracking every transaction sent by `wallet`.
    pub async fn forget_wallet(&self, wallet: &WalletAddress) -> usize {
        let mut txs = self.txs.write().await;
        let before = txs.len();
        txs.retain(|_, tx| tx.wallet != *wallet);
        before - txs.len()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    const HASH: &str = "0xABCDEF0000000000000000000000000000000000000000000000000000000001";

    fn wallet() -> WalletAddress {
        let Ok(w) = WalletAddress::parse("0x2D6048916FD4017D9348563d442a3476a710D335") else {
            panic!("valid address");
        };
        w
    }

    #[test]
    fn hash_validation() {
        assert!(normalize_tx_hash(HASH).is_ok_and(|h| h == HASH.to_ascii_lowercase()));
        assert!(normalize_tx_hash("0x1234").is_err());
        assert!(normalize_tx_hash(&HASH.replace("0x", "")).is_err());
    }

    #[tokio::test]
    async fn track_then_settle() {
        let tracker = TransactionTracker::new();
        let Ok(tx) = tracker.track(HASH, TxKind::SubmitPrompt, wallet(), None).await else {
            panic!("track failed");
        };
        assert_eq!(tx.status, TxStatus::Confirming);
        assert_eq!(tracker.pending().await.len(), 1);

        let settled = tracker.settle(&tx.hash, true, Some(42)).await;
        assert!(settled.is_some_and(|t| t.status == TxStatus::Success && t.block_number == Some(42)));
        assert!(tracker.pending().await.is_empty());

        // settling twice is a no-op
        assert!(tracker.settle(&tx.hash, false, None).await.is_none());
        assert!(tracker.get(HASH).await.is_ok_and(|t| t.status == TxStatus::Success));
    }

    #[tokio::test]
    async fn retracking_keeps_original_record() {
        let tracker = TransactionTracker::new();
        let _ = tracker.track(HASH, TxKind::PaySubscription, wallet(), None).await;
        let again = tracker
            .track(HASH, TxKind::SubmitPrompt, wallet(), None)
            .await;
        assert!(again.is_ok_and(|t| t.kind == TxKind::PaySubscription));
    }

    #[tokio::test]
    async fn prune_keeps_pending_and_recent_settlements() {
        let tracker = TransactionTracker::new();
        let pending = HASH.replace("0001", "0002");
        let _ = tracker.track(HASH, TxKind::SubmitPrompt, wallet(), None).await;
        let _ = tracker.track(&pending, TxKind::PaySubscription, wallet(), None).await;
        let _ = tracker.settle(&HASH.to_ascii_lowercase(), true, Some(7)).await;

        assert_eq!(tracker.prune_settled(Utc::now() - chrono::Duration::seconds(SETTLED_RETENTION_SECS)).await, 0);
        assert!(tracker.get(HASH).await.is_ok());

        let future = Utc::now() + chrono::Duration::seconds(1);
        assert_eq!(tracker.prune_settled(future).await, 1);
        assert!(tracker.get(HASH).await.is_err());
        assert_eq!(tracker.pending().await.len(), 1);
    }

    #[tokio::test]
    async fn forget_wallet_drops_its_transactions() {
        let tracker = TransactionTracker::new();
        let _ = tracker.track(HASH, TxKind::SubmitPrompt, wallet(), None).await;
        assert_eq!(tracker.forget_wallet(&wallet()).await, 1);
        assert!(tracker.get(HASH).await.is_err());
    }
}
