//! Wallet sessions: connect, disconnect and cached account state.
//!
//! A wallet is "connected" once the client reports its address and chain.
//! Connected wallets get their user stats polled by the
//! [`super::ContractMonitor`] and may start chat sessions and submit
//! prompts. Disconnecting drops everything cached for the address.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use utoipa::ToSchema;

use super::referral_service::{ReferralRejection, ReferralService};
use crate::client::ChainClient;
use crate::client::chain::UserStats;
use crate::config::{POLYGON_AMOY_CHAIN_ID, POLYGON_CHAIN_ID};
use crate::domain::{
    EventBus, Notification, PromptCache, SessionRegistry, TransactionTracker, WalletAddress,
};
use crate::error::GatewayError;

/// Chains the contract is deployed on.
pub const SUPPORTED_CHAINS: [u64; 2] = [POLYGON_CHAIN_ID, POLYGON_AMOY_CHAIN_ID];

/// Cached state of one connected wallet.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct WalletSession {
    /// Wallet address.
    #[schema(value_type = String)]
    pub address: WalletAddress,
    /// Chain the wallet is on.
    pub chain_id: u64,
    /// Connection time.
    pub connected_at: DateTime<Utc>,
    /// Native balance in ether units, when it could be read.
    pub balance: Option<String>,
    /// Latest `getUserStats` read.
    pub stats: Option<UserStats>,
    /// When `stats` was read.
    pub stats_updated_at: Option<DateTime<Utc>>,
    /// The wallet's own referral code.
    pub referral_code: String,
}

/// What happened to the referral code supplied on connect.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReferralOutcome {
    /// The referral was recorded.
    Tracked {
        /// Referring wallet.
        referrer: String,
    },
    /// The code was not accepted.
    Rejected {
        /// Reason.
        reason: ReferralRejection,
    },
    /// Bookkeeping is unavailable right now.
    Unavailable,
}

/// Result of a wallet connect.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ConnectOutcome {
    /// The session as stored.
    pub session: WalletSession,
    /// Referral handling, when a code was supplied.
    pub referral: Option<ReferralOutcome>,
}

/// What a disconnect removed.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct DisconnectSummary {
    /// Cached prompt submissions removed.
    pub prompts_cleared: usize,
    /// Open chat sessions closed.
    pub chat_sessions_closed: usize,
    /// Tracked transactions dropped.
    pub transactions_forgotten: usize,
}

/// Registry of connected wallets.
#[derive(Debug)]
pub struct WalletService {
    sessions: RwLock<HashMap<WalletAddress, WalletSession>>,
    chain: Arc<ChainClient>,
    referrals: ReferralService,
    prompt_cache: Arc<PromptCache>,
    chat_sessions: Arc<SessionRegistry>,
    transactions: Arc<TransactionTracker>,
    event_bus: EventBus,
}

impl WalletService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        chain: Arc<ChainClient>,
        referrals: ReferralService,
        prompt_cache: Arc<PromptCache>,
        chat_sessions: Arc<SessionRegistry>,
        transactions: Arc<TransactionTracker>,
        event_bus: EventBus,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            chain,
            referrals,
            prompt_cache,
            chat_sessions,
            transactions,
            event_bus,
        }
    }

    /// Connects a wallet.
    ///
    /// Upserts the referral user, tracks `referral_code` when given, and
    /// reads the native balance. Referral and balance failures are logged
    /// and reported in the outcome; they never fail the connect.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::UnsupportedChain`] for chains other than
    /// Polygon and Polygon Amoy.
    pub async fn connect(
        &self,
        address: WalletAddress,
        chain_id: u64,
        referral_code: Option<&str>,
    ) -> Result<ConnectOutcome, GatewayError> {
        if !SUPPORTED_CHAINS.contains(&chain_id) {
            return Err(GatewayError::UnsupportedChain(chain_id));
        }

        let referral_available = match self.referrals.create_user(&address).await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!(%address, error = %e, "referral user upsert failed");
                false
            }
        };

        let referral = match referral_code.map(str::trim).filter(|c| !c.is_empty()) {
            None => None,
            Some(_) if !referral_available => Some(ReferralOutcome::Unavailable),
            Some(code) => Some(match self.referrals.track_referral(&address, code).await {
                Ok(Ok(row)) => {
                    self.event_bus.publish(
                        Notification::success("Referral applied")
                            .with_message(format!("Referred by {}", row.referrer_address))
                            .for_wallet(&address),
                    );
                    ReferralOutcome::Tracked {
                        referrer: row.referrer_address,
                    }
                }
                Ok(Err(reason)) => ReferralOutcome::Rejected { reason },
                Err(e) => {
                    tracing::warn!(%address, error = %e, "referral tracking failed");
                    ReferralOutcome::Unavailable
                }
            }),
        };

        let balance = match address.to_alloy() {
            Ok(owner) => match self.chain.native_balance(owner).await {
                Ok(b) => Some(b),
                Err(e) => {
                    tracing::warn!(%address, error = %e, "balance read failed");
                    None
                }
            },
            Err(_) => None,
        };

        let session = WalletSession {
            referral_code: address.referral_code(),
            address: address.clone(),
            chain_id,
            connected_at: Utc::now(),
            balance,
            stats: None,
            stats_updated_at: None,
        };
        self.sessions
            .write()
            .await
            .insert(address.clone(), session.clone());

        tracing::info!(%address, chain_id, "wallet connected");
        self.event_bus.publish(
            Notification::success("Wallet connected")
                .with_message(address.short())
                .for_wallet(&address),
        );
        Ok(ConnectOutcome { session, referral })
    }

    /// Disconnects a wallet, dropping its cached account state, cached
    /// prompt submissions, open chat sessions and tracked transactions.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WalletNotConnected`] if the wallet is not
    /// connected.
    pub async fn disconnect(
        &self,
        address: &WalletAddress,
    ) -> Result<DisconnectSummary, GatewayError> {
        if self.sessions.write().await.remove(address).is_none() {
            return Err(GatewayError::WalletNotConnected(address.to_string()));
        }
        let summary = DisconnectSummary {
            prompts_cleared: self.prompt_cache.clear_wallet(address).await,
            chat_sessions_closed: self.chat_sessions.remove_for_wallet(address).await,
            transactions_forgotten: self.transactions.forget_wallet(address).await,
        };
        tracing::info!(
            %address,
            prompts = summary.prompts_cleared,
            sessions = summary.chat_sessions_closed,
            "wallet disconnected"
        );
        self.event_bus.publish(Notification::info("Wallet disconnected").for_wallet(address));
        Ok(summary)
    }

    /// The wallet's cached session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WalletNotConnected`] if the wallet is not
    /// connected.
    pub async fn get(&self, address: &WalletAddress) -> Result<WalletSession, GatewayError> {
        self.sessions
            .read()
            .await
            .get(address)
            .cloned()
            .ok_or_else(|| GatewayError::WalletNotConnected(address.to_string()))
    }

    /// Fails unless the wallet is connected.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WalletNotConnected`].
    pub async fn require_connected(&self, address: &WalletAddress) -> Result<(), GatewayError> {
        if self.sessions.read().await.contains_key(address) {
            Ok(())
        } else {
            Err(GatewayError::WalletNotConnected(address.to_string()))
        }
    }

    /// Addresses of all connected wallets.
    pub async fn connected(&self) -> Vec<WalletAddress> {
        self.sessions.read().await.keys().cloned().collect()
    }

    /// Reads `getUserStats` live and caches the result.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WalletNotConnected`] or the contract read
    /// failure.
    pub async fn refresh_stats(&self, address: &WalletAddress) -> Result<UserStats, GatewayError> {
        self.require_connected(address).await?;
        let stats = self.chain.user_stats(address.to_alloy()?).await?;
        self.store_stats(address, stats.clone()).await;
        Ok(stats)
    }

    /// Caches freshly read stats. Returns `true` when an earlier read was
    /// cached and differs from this one.
    pub async fn store_stats(&self, address: &WalletAddress, stats: UserStats) -> bool {
        let mut sessions = self.sessions.write().await;
        let Some(session) = sessions.get_mut(address) else {
            return false;
        };
        let changed = session.stats.as_ref().is_some_and(|prev| *prev != stats);
        session.stats = Some(stats);
        session.stats_updated_at = Some(Utc::now());
        changed
    }
}
