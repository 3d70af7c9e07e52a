//! Ethereum JSON-RPC client for the PromptPool contract.
//!
//! Reads go through `eth_call` with ABI-encoded calldata and are decoded
//! into display-ready structs (wei amounts formatted as ether strings).
//! Writes are never signed here: the client builds [`UnsignedTx`] requests
//! that the wallet signs and broadcasts, then the receipt is polled with
//! [`ChainClient::receipt`].

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, U256, hex};
use alloy_sol_types::SolCall;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use super::abi::prompt_pool;
use crate::domain::{PromptCategory, Tier};

/// Category string recorded for free-form chat sessions.
pub const CHAT_SESSION_CATEGORY: &str = "GENERAL_CHAT";

const ETHER_DECIMALS: usize = 18;

/// Errors from the JSON-RPC endpoint or ABI decoding.
#[derive(Debug, thiserror::Error)]
pub enum ChainError {
    /// Not a 20-byte hex address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// The request never got a response.
    #[error("rpc network error: {0}")]
    Network(String),

    /// The node answered with a JSON-RPC error object.
    #[error("rpc error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code.
        code: i64,
        /// Error message from the node.
        message: String,
    },

    /// The result could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawReceipt {
    status: Option<String>,
    block_number: Option<String>,
}

/// A transaction request for the wallet to sign.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    /// Contract address.
    pub to: String,
    /// `0x`-prefixed calldata.
    pub data: String,
    /// Chain the transaction must be sent on.
    pub chain_id: u64,
    /// Called contract function.
    pub function_name: String,
}

/// Settled transaction receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Receipt {
    /// Execution succeeded (`status == 1`).
    pub success: bool,
    /// Block the transaction was included in.
    pub block_number: Option<u64>,
}

/// Per-user submission statistics from `getUserStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct UserStats {
    /// All submissions.
    pub total_submissions: String,
    /// Approved submissions.
    pub approved_submissions: String,
    /// Rewards earned, in POOL.
    pub total_rewards: String,
    /// Reputation score.
    pub reputation_score: String,
    /// Current tier discriminant.
    pub current_tier: u8,
    /// Current tier name.
    pub tier_name: String,
    /// Unix time of the last submission.
    pub last_submission_time: u64,
    /// Approvals in a row.
    pub consecutive_approvals: String,
}

/// Contract-wide statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ContractStats {
    /// Submissions across all users.
    pub total_submissions: String,
    /// POOL held by the contract.
    pub contract_balance: String,
}

/// Result of `getRewardEstimate`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RewardEstimate {
    /// Tier the prompt would land in.
    pub tier: u8,
    /// Tier name.
    pub tier_name: String,
    /// Reward in POOL.
    pub reward: String,
}

impl RewardEstimate {
    /// The estimate shown for prompts too short to query.
    #[must_use]
    pub fn zero() -> Self {
        Self {
            tier: 0,
            tier_name: Tier::Bronze.name().to_string(),
            reward: "0".to_string(),
        }
    }
}

/// A prompt record from `getPrompt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct OnChainPrompt {
    /// Prompt id.
    pub prompt_id: u64,
    /// Submitting address.
    pub contributor: String,
    /// IPFS content hash.
    pub ipfs_hash: String,
    /// Title.
    pub title: String,
    /// Category discriminant.
    pub category: u8,
    /// Tier discriminant.
    pub tier: u8,
    /// Reward in POOL.
    pub reward: String,
    /// Unix submission time.
    pub submitted_at: u64,
    /// Approved by the contract.
    pub is_approved: bool,
    /// Reward paid out.
    pub is_paid: bool,
    /// Quality score, 0..=100.
    pub quality_score: u8,
}

/// Chat earnings from `getUserChatStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChatStats {
    /// Claimed chat sessions.
    pub total_sessions: String,
    /// Messages across claimed sessions.
    pub total_messages: String,
    /// Chat rewards, in POOL.
    pub total_earned: String,
    /// Unix time of the last claimed session.
    pub last_session_time: u64,
}

/// Referral earnings from `getReferralStats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReferralRewards {
    /// Who referred this user, if anyone.
    pub referrer: Option<String>,
    /// Users this address referred.
    pub total_referrals: String,
    /// Referral rewards already claimed, in POOL.
    pub total_earned: String,
    /// Claimable referral rewards, in POOL.
    pub pending_rewards: String,
}

/// Subscription state from `getSubscriptionStatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubscriptionStatus {
    /// Subscription is paid up.
    pub active: bool,
    /// Unix time the next payment is due.
    pub due_at: u64,
    /// Earnings over the last month, in POOL.
    pub last_month_earnings: String,
    /// Cost of the next payment: a third of last month's earnings.
    pub cost: String,
}

/// JSON-RPC client bound to one contract on one chain.
pub struct ChainClient {
    client: Client,
    rpc_url: String,
    contract: Address,
    chain_id: u64,
    next_id: AtomicU64,
}

impl fmt::Debug for ChainClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainClient")
            .field("rpc_url", &self.rpc_url)
            .field("contract", &self.contract)
            .field("chain_id", &self.chain_id)
            .finish_non_exhaustive()
    }
}

impl ChainClient {
    /// Creates a client for `contract` on `chain_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ChainError::InvalidAddress`] for a malformed contract
    /// address, or [`ChainError::Network`] if the HTTP client cannot be
    /// built.
    pub fn new(
        rpc_url: impl Into<String>,
        contract: &str,
        chain_id: u64,
        timeout: Duration,
    ) -> Result<Self, ChainError> {
        let contract = parse_address(contract)?;
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ChainError::Network(e.to_string()))?;
        Ok(Self {
            client,
            rpc_url: rpc_url.into(),
            contract,
            chain_id,
            next_id: AtomicU64::new(1),
        })
    }

    /// Contract address, checksummed.
    #[must_use]
    pub fn contract_address(&self) -> String {
        self.contract.to_checksum(None)
    }

    /// Chain id transactions are built for.
    #[must_use]
    pub const fn chain_id(&self) -> u64 {
        self.chain_id
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<Option<T>, ChainError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": method,
            "params": params,
        });
        let response = self
            .client
            .post(&self.rpc_url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ChainError::Network(e.to_string()))?;
        if !response.status().is_success() {
            return Err(ChainError::Network(format!(
                "{method}: HTTP {}",
                response.status().as_u16()
            )));
        }
        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| ChainError::Decode(format!("{method}: {e}")))?;
        if let Some(err) = body.error {
            return Err(ChainError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        Ok(body.result)
    }

    /// Runs a read-only contract call and decodes its return values.
    ///
    /// # Errors
    ///
    /// Returns the RPC failure, or [`ChainError::Decode`] if the returned
    /// data does not match the function's outputs.
    pub async fn call<C: SolCall>(&self, call: &C) -> Result<C::Return, ChainError> {
        let params = json!([
            {
                "to": self.contract.to_string(),
                "data": hex::encode_prefixed(call.abi_encode()),
            },
            "latest"
        ]);
        let raw: String = self
            .request("eth_call", params)
            .await?
            .ok_or_else(|| ChainError::Decode(format!("{}: empty result", C::SIGNATURE)))?;
        let bytes = hex::decode(&raw).map_err(|e| ChainError::Decode(e.to_string()))?;
        C::abi_decode_returns(&bytes).map_err(|e| ChainError::Decode(format!("{}: {e}", C::SIGNATURE)))
    }

    /// Native token balance of `owner`, formatted in ether units.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn native_balance(&self, owner: Address) -> Result<String, ChainError> {
        let raw: String = self
            .request("eth_getBalance", json!([owner.to_string(), "latest"]))
            .await?
            .ok_or_else(|| ChainError::Decode("eth_getBalance: empty result".to_string()))?;
        let wei = raw
            .parse::<U256>()
            .map_err(|e| ChainError::Decode(format!("eth_getBalance: {e}")))?;
        Ok(format_ether(wei))
    }

    /// Receipt of `tx_hash`, or `None` while the transaction is pending.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn receipt(&self, tx_hash: &str) -> Result<Option<Receipt>, ChainError> {
        let raw: Option<RawReceipt> = self
            .request("eth_getTransactionReceipt", json!([tx_hash]))
            .await?;
        let Some(raw) = raw else {
            return Ok(None);
        };
        let status = raw
            .status
            .as_deref()
            .map(parse_quantity)
            .transpose()?
            .unwrap_or(0);
        let block_number = raw.block_number.as_deref().map(parse_quantity).transpose()?;
        Ok(Some(Receipt {
            success: status == 1,
            block_number,
        }))
    }

    /// `getUserStats(user)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn user_stats(&self, user: Address) -> Result<UserStats, ChainError> {
        let r = self.call(&prompt_pool::getUserStatsCall { user }).await?;
        Ok(UserStats {
            total_submissions: r.totalSubmissions.to_string(),
            approved_submissions: r.approvedSubmissions.to_string(),
            total_rewards: format_ether(r.totalRewards),
            reputation_score: r.reputationScore.to_string(),
            current_tier: r.currentTier,
            tier_name: Tier::from_u8(r.currentTier).name().to_string(),
            last_submission_time: to_u64(r.lastSubmissionTime),
            consecutive_approvals: r.consecutiveApprovals.to_string(),
        })
    }

    /// `getTotalSubmissions()` and `getContractBalance()`.
    ///
    /// # Errors
    ///
    /// Returns the first RPC or decode failure.
    pub async fn contract_stats(&self) -> Result<ContractStats, ChainError> {
        let total = self.call(&prompt_pool::getTotalSubmissionsCall {}).await?;
        let balance = self.call(&prompt_pool::getContractBalanceCall {}).await?;
        Ok(ContractStats {
            total_submissions: total.to_string(),
            contract_balance: format_ether(balance),
        })
    }

    /// `canSubmit(user)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn can_submit(&self, user: Address) -> Result<bool, ChainError> {
        self.call(&prompt_pool::canSubmitCall { user }).await
    }

    /// `getRewardEstimate(promptLength, category, user)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn reward_estimate(
        &self,
        prompt_length: usize,
        category: PromptCategory,
        user: Address,
    ) -> Result<RewardEstimate, ChainError> {
        let r = self
            .call(&prompt_pool::getRewardEstimateCall {
                promptLength: U256::from(prompt_length),
                category: category.as_u8(),
                user,
            })
            .await?;
        Ok(RewardEstimate {
            tier: r.tier,
            tier_name: Tier::from_u8(r.tier).name().to_string(),
            reward: format_ether(r.rewardAmount),
        })
    }

    /// `getPrompt(promptId)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn prompt(&self, prompt_id: u64) -> Result<OnChainPrompt, ChainError> {
        let r = self
            .call(&prompt_pool::getPromptCall {
                promptId: U256::from(prompt_id),
            })
            .await?;
        Ok(OnChainPrompt {
            prompt_id,
            contributor: r.contributor.to_checksum(None),
            ipfs_hash: r.ipfsHash,
            title: r.title,
            category: r.category,
            tier: r.tier,
            reward: format_ether(r.rewardAmount),
            submitted_at: to_u64(r.submittedAt),
            is_approved: r.isApproved,
            is_paid: r.isPaid,
            quality_score: r.qualityScore,
        })
    }

    /// `getUserChatStats(user)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn chat_stats(&self, user: Address) -> Result<ChatStats, ChainError> {
        let r = self.call(&prompt_pool::getUserChatStatsCall { user }).await?;
        Ok(ChatStats {
            total_sessions: r.totalSessions.to_string(),
            total_messages: r.totalMessages.to_string(),
            total_earned: format_ether(r.totalEarned),
            last_session_time: to_u64(r.lastSessionTime),
        })
    }

    /// `getReferralStats(user)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn referral_rewards(&self, user: Address) -> Result<ReferralRewards, ChainError> {
        let r = self.call(&prompt_pool::getReferralStatsCall { user }).await?;
        Ok(ReferralRewards {
            referrer: (r.referrer != Address::ZERO).then(|| r.referrer.to_checksum(None)),
            total_referrals: r.totalReferrals.to_string(),
            total_earned: format_ether(r.totalEarned),
            pending_rewards: format_ether(r.pendingRewards),
        })
    }

    /// `getSubscriptionStatus(user)`.
    ///
    /// # Errors
    ///
    /// Returns the RPC or decode failure.
    pub async fn subscription_status(
        &self,
        user: Address,
    ) -> Result<SubscriptionStatus, ChainError> {
        let r = self
            .call(&prompt_pool::getSubscriptionStatusCall { user })
            .await?;
        Ok(SubscriptionStatus {
            active: r.active,
            due_at: to_u64(r.dueAt),
            last_month_earnings: format_ether(r.lastMonthEarnings),
            cost: format_ether(r.lastMonthEarnings / U256::from(3u8)),
        })
    }

    /// `submitPrompt(ipfsHash, title, category, promptLength)`.
    #[must_use]
    pub fn submit_prompt_tx(
        &self,
        ipfs_hash: &str,
        title: &str,
        category: PromptCategory,
        prompt_length: usize,
    ) -> UnsignedTx {
        self.unsigned(&prompt_pool::submitPromptCall {
            ipfsHash: ipfs_hash.to_string(),
            title: title.to_string(),
            category: category.as_u8(),
            promptLength: U256::from(prompt_length),
        })
    }

    /// `submitChatSession(hash, messageCount, qualityScore, duration, "GENERAL_CHAT", true)`.
    #[must_use]
    pub fn submit_chat_session_tx(
        &self,
        conversation_hash: &str,
        message_count: usize,
        quality_score: u64,
        duration_secs: u64,
    ) -> UnsignedTx {
        self.unsigned(&prompt_pool::submitChatSessionCall {
            conversationHash: conversation_hash.to_string(),
            messageCount: U256::from(message_count),
            qualityScore: U256::from(quality_score),
            sessionDuration: U256::from(duration_secs),
            category: CHAT_SESSION_CATEGORY.to_string(),
            allowTraining: true,
        })
    }

    /// `claimReferralRewards()`.
    #[must_use]
    pub fn claim_referral_rewards_tx(&self) -> UnsignedTx {
        self.unsigned(&prompt_pool::claimReferralRewardsCall {})
    }

    /// `paySubscription()`.
    #[must_use]
    pub fn pay_subscription_tx(&self) -> UnsignedTx {
        self.unsigned(&prompt_pool::paySubscriptionCall {})
    }

    fn unsigned<C: SolCall>(&self, call: &C) -> UnsignedTx {
        let function_name = C::SIGNATURE
            .split('(')
            .next()
            .unwrap_or(C::SIGNATURE)
            .to_string();
        UnsignedTx {
            to: self.contract_address(),
            data: hex::encode_prefixed(call.abi_encode()),
            chain_id: self.chain_id,
            function_name,
        }
    }
}

/// Parses a hex address.
///
/// # Errors
///
/// Returns [`ChainError::InvalidAddress`] on malformed input.
pub fn parse_address(raw: &str) -> Result<Address, ChainError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|_| ChainError::InvalidAddress(raw.to_string()))
}

/// Formats a wei amount as ether: integer part, then up to 18 fraction
/// digits with trailing zeros trimmed. `1.5e18` becomes `"1.5"`.
#[must_use]
pub fn format_ether(wei: U256) -> String {
    let digits = wei.to_string();
    let (integer, fraction) = if digits.len() > ETHER_DECIMALS {
        let (int, frac) = digits.split_at(digits.len() - ETHER_DECIMALS);
        (int.to_string(), frac.to_string())
    } else {
        ("0".to_string(), format!("{digits:0>ETHER_DECIMALS$}"))
    };
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        integer
    } else {
        format!("{integer}.{fraction}")
    }
}

fn parse_quantity(raw: &str) -> Result<u64, ChainError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16).map_err(|e| ChainError::Decode(format!("{raw}: {e}")))
}

fn to_u64(value: U256) -> u64 {
    u64::try_from(value).unwrap_or(u64::MAX)
}
