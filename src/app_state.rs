//! Shared application state injected into all Axum handlers.

use std::sync::Arc;
use std::time::Duration;

use crate::client::{ChainClient, GroqClient, PinataClient};
use crate::config::GatewayConfig;
use crate::domain::{
    EventBus, GasAssumptions, PromptCache, SessionRegistry, TransactionTracker,
};
use crate::error::GatewayError;
use crate::persistence::ReferralStore;
use crate::service::{
    ChatService, ContractMonitor, PollIntervals, PromptService, ReferralService, WalletService,
};

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Loaded configuration.
    pub config: Arc<GatewayConfig>,
    /// Connected wallets.
    pub wallets: Arc<WalletService>,
    /// Prompt submissions.
    pub prompts: Arc<PromptService>,
    /// Chat sessions.
    pub chat: Arc<ChatService>,
    /// Referral bookkeeping.
    pub referrals: ReferralService,
    /// Contract polling and transaction tracking.
    pub monitor: Arc<ContractMonitor>,
    /// Contract reads and transaction builders.
    pub chain: Arc<ChainClient>,
    /// LLM proxy for the `/api/chat-groq` endpoints.
    pub llm: Arc<GroqClient>,
    /// Pinning client for `/api/upload-to-ipfs`.
    pub pinata: Arc<PinataClient>,
    /// Event bus for WebSocket subscriptions.
    pub event_bus: EventBus,
}

impl AppState {
    /// Wires clients, stores and services from `config`.
    ///
    /// Opens the prompt cache snapshot when `PROMPT_CACHE_PATH` is set.
    /// Background polling is not started; call
    /// [`ContractMonitor::spawn`] on [`AppState::monitor`].
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be built, the contract
    /// address is malformed, or the cache snapshot cannot be read.
    pub async fn build(
        config: GatewayConfig,
        store: Arc<dyn ReferralStore>,
    ) -> Result<Self, GatewayError> {
        let timeout = Duration::from_secs(config.http_timeout_secs);
        let llm = Arc::new(GroqClient::new(
            config.groq_api_url.clone(),
            config.groq_model.clone(),
            config.groq_api_key.clone(),
            timeout,
        )?);
        let pinata = Arc::new(PinataClient::new(
            config.pinata_api_url.clone(),
            config.pinata_gateway_url.clone(),
            config.pinata_jwt.clone(),
            timeout,
        )?);
        let chain = Arc::new(ChainClient::new(
            config.rpc_url.clone(),
            &config.contract_address,
            config.chain_id,
            timeout,
        )?);

        let prompt_cache = Arc::new(match &config.prompt_cache_path {
            Some(path) => PromptCache::open(path.clone()).await?,
            None => PromptCache::new(),
        });
        let chat_sessions = Arc::new(SessionRegistry::new());
        let transactions = Arc::new(TransactionTracker::new());
        let event_bus = EventBus::new(config.event_bus_capacity);
        let referrals = ReferralService::new(store);
        let gas = GasAssumptions {
            gas_cost_usd: config.gas_cost_usd,
            pool_price_usd: config.pool_price_usd,
        };

        let wallets = Arc::new(WalletService::new(
            Arc::clone(&chain),
            referrals.clone(),
            Arc::clone(&prompt_cache),
            Arc::clone(&chat_sessions),
            Arc::clone(&transactions),
            event_bus.clone(),
        ));
        let prompts = Arc::new(PromptService::new(
            Arc::clone(&prompt_cache),
            Arc::clone(&wallets),
            Arc::clone(&pinata),
            Arc::clone(&chain),
            Arc::clone(&transactions),
            event_bus.clone(),
        ));
        let chat = Arc::new(ChatService::new(
            chat_sessions,
            Arc::clone(&wallets),
            Arc::clone(&llm),
            Arc::clone(&pinata),
            Arc::clone(&chain),
            gas,
            event_bus.clone(),
        ));
        let monitor = Arc::new(ContractMonitor::new(
            Arc::clone(&chain),
            Arc::clone(&wallets),
            transactions,
            prompt_cache,
            event_bus.clone(),
            PollIntervals {
                contract_stats: Duration::from_secs(config.contract_stats_poll_secs.max(1)),
                user_stats: Duration::from_secs(config.user_stats_poll_secs.max(1)),
                receipts: Duration::from_secs(config.tx_poll_secs.max(1)),
            },
        ));

        Ok(Self {
            config: Arc::new(config),
            wallets,
            prompts,
            chat,
            referrals,
            monitor,
            chain,
            llm,
            pinata,
            event_bus,
        })
    }
}
