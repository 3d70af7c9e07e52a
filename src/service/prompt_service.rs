//! Prompt submission: validate, pin, cache, and hand back the
//! `submitPrompt` transaction.

use std::sync::Arc;

use serde::Serialize;
use utoipa::ToSchema;

use super::WalletService;
use crate::client::chain::{OnChainPrompt, RewardEstimate};
use crate::client::pinata::is_valid_ipfs_hash;
use crate::client::{ChainClient, PinataClient, PromptPin, UnsignedTx};
use crate::domain::prompt::MIN_PROMPT_LENGTH;
use crate::domain::{
    CachedPrompt, EventBus, Notification, OnChainFields, PromptCache, PromptCategory, PromptDraft,
    SubmissionStatus, TrackedTransaction, TransactionTracker, TxKind, WalletAddress,
};
use crate::error::GatewayError;

/// A pinned and cached submission plus the transaction to sign.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionOutcome {
    /// Cached record, status `pending`.
    pub prompt: CachedPrompt,
    /// `submitPrompt` request for the wallet to sign.
    pub transaction: UnsignedTx,
}

/// Orchestrates prompt submissions.
#[derive(Debug)]
pub struct PromptService {
    cache: Arc<PromptCache>,
    wallets: Arc<WalletService>,
    pinata: Arc<PinataClient>,
    chain: Arc<ChainClient>,
    transactions: Arc<TransactionTracker>,
    event_bus: EventBus,
}

impl PromptService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        cache: Arc<PromptCache>,
        wallets: Arc<WalletService>,
        pinata: Arc<PinataClient>,
        chain: Arc<ChainClient>,
        transactions: Arc<TransactionTracker>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            cache,
            wallets,
            pinata,
            chain,
            transactions,
            event_bus,
        }
    }

    /// Validates, pins and caches a prompt.
    ///
    /// Validation runs before any network call. Pinning falls back to a
    /// simulated hash (demo mode) when unconfigured or failing.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a blank title or
    /// short content, or [`GatewayError::WalletNotConnected`].
    pub async fn submit(
        &self,
        title: &str,
        content: &str,
        category: PromptCategory,
        author: WalletAddress,
    ) -> Result<SubmissionOutcome, GatewayError> {
        let draft = PromptDraft::validate(title, content, category, author)?;
        self.wallets.require_connected(&draft.author).await?;

        let pin = self
            .pinata
            .pin_or_simulate(&PromptPin {
                title: draft.title.clone(),
                content: draft.content.clone(),
                category: draft.category.as_u8(),
                author: draft.author.as_str().to_string(),
                submitted_at: draft.submitted_at,
            })
            .await;

        let transaction = self.chain.submit_prompt_tx(
            &pin.hash,
            &draft.title,
            draft.category,
            draft.length(),
        );
        let prompt = CachedPrompt {
            id: uuid::Uuid::new_v4(),
            title: draft.title,
            content: draft.content,
            category: draft.category,
            author: draft.author,
            submitted_at: draft.submitted_at,
            ipfs_hash: pin.hash,
            ipfs_url: pin.url,
            is_demo: pin.is_demo,
            status: SubmissionStatus::Pending,
            tx_hash: None,
            on_chain: OnChainFields::default(),
        };
        self.cache.insert(prompt.clone()).await;

        tracing::info!(
            prompt_id = %prompt.id,
            author = %prompt.author,
            ipfs_hash = %prompt.ipfs_hash,
            is_demo = prompt.is_demo,
            "prompt pinned"
        );
        let title = if prompt.is_demo {
            "Prompt stored (demo mode)"
        } else {
            "Prompt uploaded to IPFS"
        };
        self.event_bus.publish(
            Notification::success(title)
                .with_message(prompt.ipfs_hash.clone())
                .for_wallet(&prompt.author),
        );

        Ok(SubmissionOutcome {
            prompt,
            transaction,
        })
    }

    /// The wallet's cached submissions, newest first.
    pub async fn list(&self, wallet: &WalletAddress) -> Vec<CachedPrompt> {
        self.cache.list(wallet).await
    }

    /// One cached submission.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PromptNotFound`].
    pub async fn get(&self, id: uuid::Uuid) -> Result<CachedPrompt, GatewayError> {
        self.cache
            .get(id)
            .await
            .ok_or(GatewayError::PromptNotFound(id))
    }

    /// Records the hash of the signed `submitPrompt` transaction and
    /// starts tracking its receipt.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PromptNotFound`], or
    /// [`GatewayError::InvalidRequest`] for a malformed hash.
    pub async fn attach_transaction(
        &self,
        id: uuid::Uuid,
        tx_hash: &str,
    ) -> Result<TrackedTransaction, GatewayError> {
        let prompt = self.get(id).await?;
        let tracked = self
            .transactions
            .track(tx_hash, TxKind::SubmitPrompt, prompt.author.clone(), Some(id))
            .await?;
        let hash = tracked.hash.clone();
        self.cache
            .update(id, |p| p.tx_hash = Some(hash))
            .await?;

        tracing::info!(prompt_id = %id, tx_hash = %tracked.hash, "prompt transaction attached");
        self.event_bus.publish(
            Notification::loading("Confirming transaction")
                .with_message(TxKind::SubmitPrompt.label())
                .with_tx_hash(tracked.hash.clone())
                .for_wallet(&prompt.author),
        );
        Ok(tracked)
    }

    /// Reads `getPrompt(prompt_id)` and copies approval, payment, tier,
    /// reward and quality onto the cached record.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::PromptNotFound`] or the contract read
    /// failure.
    pub async fn refresh(
        &self,
        id: uuid::Uuid,
        on_chain_id: u64,
    ) -> Result<CachedPrompt, GatewayError> {
        self.get(id).await?;
        let record = self.chain.prompt(on_chain_id).await?;
        self.cache
            .update(id, |p| apply_on_chain(p, &record))
            .await
    }

    /// Live `getRewardEstimate` preview. Content shorter than
    /// [`MIN_PROMPT_LENGTH`] yields zero without a contract call.
    ///
    /// # Errors
    ///
    /// Returns the contract read failure.
    pub async fn estimate(
        &self,
        prompt_length: usize,
        category: PromptCategory,
        wallet: &WalletAddress,
    ) -> Result<RewardEstimate, GatewayError> {
        if prompt_length < MIN_PROMPT_LENGTH {
            return Ok(RewardEstimate::zero());
        }
        Ok(self
            .chain
            .reward_estimate(prompt_length, category, wallet.to_alloy()?)
            .await?)
    }

    /// Fetches a pinned object through the gateway chain.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for a malformed hash or
    /// [`GatewayError::NotFound`] when every gateway fails.
    pub async fn fetch_ipfs(&self, hash: &str) -> Result<serde_json::Value, GatewayError> {
        if !is_valid_ipfs_hash(hash) {
            return Err(GatewayError::InvalidRequest(format!("invalid IPFS hash: {hash}")));
        }
        self.pinata
            .fetch(hash)
            .await
            .ok_or_else(|| GatewayError::NotFound(format!("IPFS object {hash}")))
    }
}

fn apply_on_chain(prompt: &mut CachedPrompt, record: &OnChainPrompt) {
    prompt.on_chain = OnChainFields {
        prompt_id: Some(record.prompt_id),
        tier: Some(record.tier),
        reward: Some(record.reward.clone()),
        is_approved: record.is_approved,
        is_paid: record.is_paid,
        quality_score: Some(record.quality_score),
    };
    if prompt.status == SubmissionStatus::Pending {
        prompt.status = SubmissionStatus::Confirmed;
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::config::{DEFAULT_CONTRACT_ADDRESS, POLYGON_CHAIN_ID};
    use crate::domain::SessionRegistry;
    use crate::persistence::InMemoryReferralStore;
    use crate::service::ReferralService;

    fn wallet() -> WalletAddress {
        let Ok(w) = WalletAddress::parse("0xaaaaaa0000000000000000000000000000000001") else {
            panic!("valid address");
        };
        w
    }

    async fn service() -> PromptService {
        let timeout = Duration::from_millis(300);
        let Ok(chain) = ChainClient::new("http://127.0.0.1:9", DEFAULT_CONTRACT_ADDRESS, POLYGON_CHAIN_ID, timeout) else {
            panic!("chain");
        };
        let Ok(pinata) = PinataClient::new("http://127.0.0.1:9", "http://127.0.0.1:9", None, timeout) else {
            panic!("pinata");
        };
        let chain = Arc::new(chain);
        let cache = Arc::new(PromptCache::new());
        let txs = Arc::new(TransactionTracker::new());
        let bus = EventBus::new(16);
        let wallets = Arc::new(WalletService::new(
            Arc::clone(&chain),
            ReferralService::new(Arc::new(InMemoryReferralStore::new())),
            Arc::clone(&cache),
            Arc::new(SessionRegistry::new()),
            Arc::clone(&txs),
            bus.clone(),
        ));
        let _ = wallets.connect(wallet(), POLYGON_CHAIN_ID, None).await;
        PromptService::new(cache, wallets, Arc::new(pinata), chain, txs, bus)
    }

    #[tokio::test]
    async fn short_content_is_rejected_before_pinning() {
        let svc = service().await;
        let result = svc
            .submit("Title", "too short", PromptCategory::Other, wallet())
            .await;
        assert!(matches!(result, Err(GatewayError::InvalidRequest(_))));
        assert!(svc.list(&wallet()).await.is_empty());
    }

    #[tokio::test]
    async fn unconfigured_pinning_yields_demo_submission() {
        let svc = service().await;
        let Ok(outcome) = svc
            .submit(
                "Ownership",
                "Explain Rust ownership to a Python developer",
                PromptCategory::Educational,
                wallet(),
            )
            .await
        else {
            panic!("submit");
        };
        assert!(outcome.prompt.is_demo);
        assert!(outcome.prompt.ipfs_hash.starts_with("Qm"));
        assert_eq!(outcome.prompt.status, SubmissionStatus::Pending);
        assert_eq!(outcome.transaction.function_name, "submitPrompt");
        assert_eq!(svc.list(&wallet()).await.len(), 1);
    }

    #[tokio::test]
    async fn attaching_a_transaction_tracks_it() {
        let svc = service().await;
        let Ok(outcome) = svc
            .submit(
                "Ownership",
                "Explain Rust ownership to a Python developer",
                PromptCategory::Educational,
                wallet(),
            )
            .await
        else {
            panic!("submit");
        };
        let hash = format!("0x{}", "ab".repeat(32));
        let Ok(tracked) = svc.attach_transaction(outcome.prompt.id, &hash).await else {
            panic!("attach");
        };
        assert_eq!(tracked.prompt_id, Some(outcome.prompt.id));
        assert!(svc
            .get(outcome.prompt.id)
            .await
            .is_ok_and(|p| p.tx_hash.as_deref() == Some(hash.as_str())));
        assert!(svc.attach_transaction(uuid::Uuid::new_v4(), &hash).await.is_err());
    }

    #[tokio::test]
    async fn short_estimate_skips_contract() {
        let svc = service().await;
        let estimate = svc.estimate(5, PromptCategory::Other, &wallet()).await;
        assert!(estimate.is_ok_and(|e| e.reward == "0"));
    }

    #[tokio::test]
    async fn malformed_ipfs_hash_is_rejected() {
        let svc = service().await;
        assert!(matches!(
            svc.fetch_ipfs("not-a-cid").await,
            Err(GatewayError::InvalidRequest(_))
        ));
    }

    #[test]
    fn on_chain_fields_confirm_pending_records() {
        let mut prompt = CachedPrompt {
            id: uuid::Uuid::new_v4(),
            title: "t".to_string(),
            content: "c".repeat(30),
            category: PromptCategory::Other,
            author: wallet(),
            submitted_at: 0,
            ipfs_hash: "Qm".to_string(),
            ipfs_url: String::new(),
            is_demo: false,
            status: SubmissionStatus::Pending,
            tx_hash: None,
            on_chain: OnChainFields::default(),
        };
        let record = OnChainPrompt {
            prompt_id: 7,
            contributor: wallet().to_string(),
            ipfs_hash: "Qm".to_string(),
            title: "t".to_string(),
            category: 5,
            tier: 1,
            reward: "2.5".to_string(),
            submitted_at: 0,
            is_approved: true,
            is_paid: false,
            quality_score: 80,
        };
        apply_on_chain(&mut prompt, &record);
        assert_eq!(prompt.status, SubmissionStatus::Confirmed);
        assert_eq!(prompt.on_chain.prompt_id, Some(7));
        assert!(prompt.on_chain.is_approved);
    }
}
