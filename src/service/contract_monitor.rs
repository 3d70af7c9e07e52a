//! Background polling of the PromptPool contract.
//!
//! Three `tokio::time::interval` loops:
//!
//! - contract statistics (total submissions, contract balance),
//! - user statistics of every connected wallet,
//! - receipts of tracked transactions.
//!
//! Poll failures are logged and the previous cached value is kept. A
//! settled `submitPrompt` receipt updates the cached submission.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use super::WalletService;
use crate::client::ChainClient;
use crate::client::chain::ContractStats;
use crate::domain::notification::FAILURE_DURATION_MS;
use crate::domain::transaction::SETTLED_RETENTION_SECS;
use crate::domain::{
    EventBus, Notification, PromptCache, SubmissionStatus, TrackedTransaction,
    TransactionTracker, TxKind, TxStatus, WalletAddress,
};
use crate::error::GatewayError;

/// Polling periods.
#[derive(Debug, Clone, Copy)]
pub struct PollIntervals {
    /// Contract statistics.
    pub contract_stats: Duration,
    /// Per-wallet user statistics.
    pub user_stats: Duration,
    /// Transaction receipts.
    pub receipts: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            contract_stats: Duration::from_secs(30),
            user_stats: Duration::from_secs(10),
            receipts: Duration::from_secs(5),
        }
    }
}

/// Cached contract statistics with their read time.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ContractSnapshot {
    /// Latest read.
    #[serde(flatten)]
    pub stats: ContractStats,
    /// When it was read.
    pub updated_at: DateTime<Utc>,
}

/// Polls the contract and settles tracked transactions.
#[derive(Debug)]
pub struct ContractMonitor {
    chain: Arc<ChainClient>,
    wallets: Arc<WalletService>,
    transactions: Arc<TransactionTracker>,
    prompt_cache: Arc<PromptCache>,
    event_bus: EventBus,
    contract_stats: RwLock<Option<ContractSnapshot>>,
    intervals: PollIntervals,
}

impl ContractMonitor {
    /// Creates the monitor. Nothing runs until [`ContractMonitor::spawn`].
    #[must_use]
    pub fn new(
        chain: Arc<ChainClient>,
        wallets: Arc<WalletService>,
        transactions: Arc<TransactionTracker>,
        prompt_cache: Arc<PromptCache>,
        event_bus: EventBus,
        intervals: PollIntervals,
    ) -> Self {
        Self {
            chain,
            wallets,
            transactions,
            prompt_cache,
            event_bus,
            contract_stats: RwLock::new(None),
            intervals,
        }
    }

    /// Starts the three polling loops.
    pub fn spawn(self: &Arc<Self>) -> Vec<JoinHandle<()>> {
        let stats = {
            let monitor = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(monitor.intervals.contract_stats);
                loop {
                    ticker.tick().await;
                    if let Err(e) = monitor.poll_contract_stats().await {
                        tracing::warn!(error = %e, "contract stats poll failed");
                    }
                }
            })
        };
        let users = {
            let monitor = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(monitor.intervals.user_stats);
                loop {
                    ticker.tick().await;
                    monitor.poll_user_stats().await;
                }
            })
        };
        let receipts = {
            let monitor = Arc::clone(self);
            tokio::spawn(async move {
                let mut ticker = tokio::time::interval(monitor.intervals.receipts);
                loop {
                    ticker.tick().await;
                    monitor.poll_receipts().await;
                }
            })
        };
        tracing::info!(intervals = ?self.intervals, "contract monitor started");
        vec![stats, users, receipts]
    }

    /// Cached contract statistics, read live when nothing is cached yet.
    ///
    /// # Errors
    ///
    /// Returns the contract read failure when there is no cached value.
    pub async fn contract_stats(&self) -> Result<ContractSnapshot, GatewayError> {
        if let Some(snapshot) = self.contract_stats.read().await.clone() {
            return Ok(snapshot);
        }
        self.poll_contract_stats().await
    }

    /// Reads contract statistics and caches them. Publishes a global
    /// notification when the submission count changes.
    ///
    /// # Errors
    ///
    /// Returns the contract read failure; the cache is left untouched.
    pub async fn poll_contract_stats(&self) -> Result<ContractSnapshot, GatewayError> {
        let stats = self.chain.contract_stats().await?;
        let snapshot = ContractSnapshot {
            stats,
            updated_at: Utc::now(),
        };
        let previous = self.contract_stats.write().await.replace(snapshot.clone());
        if let Some(prev) = previous {
            if prev.stats.total_submissions != snapshot.stats.total_submissions {
                self.event_bus.publish(
                    Notification::info("New prompts on PromptPool").with_message(format!(
                        "{} total submissions",
                        snapshot.stats.total_submissions
                    )),
                );
            }
        }
        Ok(snapshot)
    }

    /// Refreshes `getUserStats` for every connected wallet.
    pub async fn poll_user_stats(&self) {
        for wallet in self.wallets.connected().await {
            if let Err(e) = self.poll_wallet(&wallet).await {
                tracing::warn!(%wallet, error = %e, "user stats poll failed");
            }
        }
    }

    async fn poll_wallet(&self, wallet: &WalletAddress) -> Result<(), GatewayError> {
        let stats = self.chain.user_stats(wallet.to_alloy()?).await?;
        let summary = format!(
            "{} submissions, {} POOL earned, {} tier",
            stats.total_submissions, stats.total_rewards, stats.tier_name
        );
        if self.wallets.store_stats(wallet, stats).await {
            tracing::debug!(%wallet, %summary, "user stats changed");
            self.event_bus.publish(
                Notification::info("Your stats were updated")
                    .with_message(summary)
                    .for_wallet(wallet),
            );
        }
        Ok(())
    }

    /// Checks the receipt of every pending transaction once, after
    /// pruning settlements older than [`SETTLED_RETENTION_SECS`].
    pub async fn poll_receipts(&self) {
        let pruned = self
            .transactions
            .prune_settled(Utc::now() - chrono::Duration::seconds(SETTLED_RETENTION_SECS))
            .await;
        if pruned > 0 {
            tracing::debug!(pruned, "pruned settled transactions");
        }
        for tx in self.transactions.pending().await {
            match self.chain.receipt(&tx.hash).await {
                Ok(Some(receipt)) => {
                    if let Some(settled) = self
                        .transactions
                        .settle(&tx.hash, receipt.success, receipt.block_number)
                        .await
                    {
                        self.on_settled(&settled).await;
                    }
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(tx_hash = %tx.hash, error = %e, "receipt poll failed"),
            }
        }
    }

    /// Starts tracking a transaction the wallet sent.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a malformed hash.
    pub async fn track(
        &self,
        hash: &str,
        kind: TxKind,
        wallet: WalletAddress,
    ) -> Result<TrackedTransaction, GatewayError> {
        let tracked = self.transactions.track(hash, kind, wallet, None).await?;
        self.event_bus.publish(
            Notification::loading("Confirming transaction")
                .with_message(kind.label())
                .with_tx_hash(tracked.hash.clone())
                .for_wallet(&tracked.wallet),
        );
        Ok(tracked)
    }

    /// A tracked transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::TransactionNotFound`].
    pub async fn transaction(&self, hash: &str) -> Result<TrackedTransaction, GatewayError> {
        self.transactions.get(hash).await
    }

    async fn on_settled(&self, tx: &TrackedTransaction) {
        let success = tx.status == TxStatus::Success;
        tracing::info!(
            tx_hash = %tx.hash,
            kind = ?tx.kind,
            success,
            block = ?tx.block_number,
            "transaction settled"
        );

        // Transactions tracked through `/transactions` carry no prompt id;
        // fall back to the hash attached to the cached submission.
        let prompt_id = match tx.prompt_id {
            Some(id) => Some(id),
            None if tx.kind == TxKind::SubmitPrompt => {
                self.prompt_cache.find_by_tx(&tx.hash).await.map(|p| p.id)
            }
            None => None,
        };
        if let Some(prompt_id) = prompt_id {
            if let Err(e) = self.settle_prompt(prompt_id, success).await {
                tracing::warn!(%prompt_id, error = %e, "cached prompt update failed");
            }
        }

        let notification = if success {
            Notification::success(format!("{} confirmed", tx.kind.label()))
        } else {
            Notification::error(format!("{} failed", tx.kind.label()))
                .with_message("Transaction reverted")
                .with_duration_ms(FAILURE_DURATION_MS)
        };
        self.event_bus.publish(
            notification
                .with_tx_hash(tx.hash.clone())
                .for_wallet(&tx.wallet),
        );
    }

    async fn settle_prompt(&self, id: uuid::Uuid, success: bool) -> Result<(), GatewayError> {
        if !success {
            self.prompt_cache
                .update(id, |p| p.status = SubmissionStatus::Failed)
                .await?;
            return Ok(());
        }

        let prompt = self
            .prompt_cache
            .update(id, |p| p.status = SubmissionStatus::Confirmed)
            .await?;
        let estimate = self
            .chain
            .reward_estimate(prompt.length(), prompt.category, prompt.author.to_alloy()?)
            .await?;
        self.prompt_cache
            .update(id, |p| {
                p.on_chain.tier = Some(estimate.tier);
                p.on_chain.reward = Some(estimate.reward);
            })
            .await?;
        Ok(())
    }
}
