//! Chat service: Pool AI sessions, live reward estimates and session claims.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use super::WalletService;
use crate::client::{ChainClient, GroqClient, PinataClient, PromptPin, UnsignedTx};
use crate::domain::chat::{APOLOGY, MIN_CLAIM_MESSAGES, format_session_time};
use crate::domain::rewards::{self, GasAssumptions, SessionRewards};
use crate::domain::{
    ChatMessage, ChatRole, ChatSession, EventBus, Notification, PromptCategory, SessionRegistry,
    WalletAddress,
};
use crate::error::GatewayError;

/// Platform tag written into pinned transcripts.
pub const PLATFORM: &str = "PromptPool";

/// Transcript format version.
pub const TRANSCRIPT_VERSION: &str = "1.0";

/// Outcome of one chat turn.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChatTurn {
    /// The user's message as stored.
    pub user_message: ChatMessage,
    /// Pool AI's reply, or the apology when the provider failed.
    pub reply: ChatMessage,
    /// The provider failed and the apology was appended.
    pub degraded: bool,
    /// Estimate after this turn.
    pub rewards: SessionRewards,
}

/// A user message with its quality score, as stored in the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredMessage {
    /// Message role.
    pub role: ChatRole,
    /// Message text.
    pub content: String,
    /// Unix timestamp in milliseconds.
    pub timestamp: i64,
    /// Session quality score at claim time.
    pub quality_score: f64,
}

/// Session statistics stored in the transcript.
#[derive(Debug, Clone, Serialize)]
pub struct SessionStats {
    /// User messages.
    pub total_messages: usize,
    /// Session length in seconds.
    pub duration: u64,
    /// Estimated earnings at claim time.
    pub earnings: f64,
    /// Gas efficiency at claim time.
    pub gas_efficiency: f64,
}

/// The conversation bundle pinned when a session is claimed.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationData {
    /// Session identifier, `session_<ms>_<last 6 of address>`.
    pub session_id: String,
    /// Claiming wallet.
    pub user_address: String,
    /// All user and assistant messages.
    pub messages: Vec<ScoredMessage>,
    /// Session statistics.
    pub session_stats: SessionStats,
    /// The user agreed to training use.
    pub privacy_consent: bool,
    /// Unix timestamp in milliseconds.
    pub collected_at: i64,
    /// Platform tag.
    pub platform: &'static str,
    /// Format version.
    pub version: &'static str,
}

/// Result of ending a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionClaim {
    /// Closed session.
    pub session_id: uuid::Uuid,
    /// Pinned transcript hash, or the `chat_<ms>_<suffix>` fallback.
    pub conversation_hash: String,
    /// The transcript could not be pinned.
    pub is_fallback: bool,
    /// Final estimate.
    pub rewards: SessionRewards,
    /// Session length in seconds.
    pub duration_secs: u64,
    /// `submitChatSession` request for the wallet to sign.
    pub transaction: UnsignedTx,
}

/// Orchestrates chat sessions.
#[derive(Debug)]
pub struct ChatService {
    sessions: Arc<SessionRegistry>,
    wallets: Arc<WalletService>,
    llm: Arc<GroqClient>,
    pinata: Arc<PinataClient>,
    chain: Arc<ChainClient>,
    gas: GasAssumptions,
    event_bus: EventBus,
}

impl ChatService {
    /// Creates the service.
    #[must_use]
    pub fn new(
        sessions: Arc<SessionRegistry>,
        wallets: Arc<WalletService>,
        llm: Arc<GroqClient>,
        pinata: Arc<PinataClient>,
        chain: Arc<ChainClient>,
        gas: GasAssumptions,
        event_bus: EventBus,
    ) -> Self {
        Self {
            sessions,
            wallets,
            llm,
            pinata,
            chain,
            gas,
            event_bus,
        }
    }

    /// Gas assumptions used for estimates.
    #[must_use]
    pub const fn gas(&self) -> GasAssumptions {
        self.gas
    }

    /// Starts a session seeded with the greeting.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WalletNotConnected`] if the wallet is not
    /// connected.
    pub async fn start(&self, wallet: WalletAddress) -> Result<ChatSession, GatewayError> {
        self.wallets.require_connected(&wallet).await?;
        let session = ChatSession::new(wallet);
        self.sessions.insert(session.clone()).await?;
        tracing::info!(session_id = %session.id, wallet = %session.wallet, "chat session started");
        Ok(session)
    }

    /// A snapshot of the session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`].
    pub async fn get(&self, id: uuid::Uuid) -> Result<ChatSession, GatewayError> {
        let lock = self.sessions.get(id).await?;
        let session = lock.read().await.clone();
        Ok(session)
    }

    /// Current estimate for the session.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::SessionNotFound`].
    pub async fn rewards(&self, id: uuid::Uuid) -> Result<SessionRewards, GatewayError> {
        let lock = self.sessions.get(id).await?;
        let session = lock.read().await;
        Ok(rewards::estimate(&session.messages, self.gas))
    }

    /// Sends a user message and appends Pool AI's reply.
    ///
    /// The user message is stored before the provider call; the session
    /// lock is not held across it. The turn finishes even if the caller
    /// stops waiting. A provider failure appends the apology instead of
    /// failing the turn.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::InvalidRequest`] for blank input,
    /// [`GatewayError::Conflict`] while a reply is still pending, or
    /// [`GatewayError::SessionNotFound`].
    pub async fn send(&self, id: uuid::Uuid, text: &str) -> Result<ChatTurn, GatewayError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GatewayError::InvalidRequest("Message is required".to_string()));
        }
        let lock = self.sessions.get(id).await?;

        let (user_message, history, wallet) = {
            let mut session = lock.write().await;
            if session.awaiting_reply {
                return Err(GatewayError::Conflict(
                    "a reply is still pending for this session".to_string(),
                ));
            }
            let history = session.messages.clone();
            let user_message = ChatMessage::now(ChatRole::User, text);
            session.messages.push(user_message.clone());
            session.awaiting_reply = true;
            (user_message, history, session.wallet.clone())
        };

        // The provider call and the reply append run detached so a dropped
        // request still completes the turn and clears `awaiting_reply`.
        let llm = Arc::clone(&self.llm);
        let event_bus = self.event_bus.clone();
        let gas = self.gas;
        let prompt = text.to_string();
        let turn = tokio::spawn(async move {
            let (reply, degraded) = match llm.chat(&prompt, &history).await {
                Ok(completion) => (ChatMessage::now(ChatRole::Assistant, completion.content), false),
                Err(e) => {
                    tracing::warn!(session_id = %id, error = %e, "chat reply failed");
                    event_bus.publish(
                        Notification::error("Pool AI is unavailable")
                            .with_message(APOLOGY)
                            .for_wallet(&wallet),
                    );
                    (ChatMessage::now(ChatRole::Assistant, APOLOGY), true)
                }
            };

            let mut session = lock.write().await;
            session.messages.push(reply.clone());
            session.awaiting_reply = false;
            let rewards = rewards::estimate(&session.messages, gas);
            tracing::debug!(
                session_id = %id,
                message_count = rewards.message_count,
                earnings = rewards.current_earnings,
                "chat turn completed"
            );
            (reply, degraded, rewards)
        });
        let (reply, degraded, rewards) = turn
            .await
            .map_err(|e| GatewayError::Internal(format!("chat turn failed: {e}")))?;

        Ok(ChatTurn {
            user_message,
            reply,
            degraded,
            rewards,
        })
    }

    /// Ends the session: pins the transcript and returns the
    /// `submitChatSession` transaction.
    ///
    /// The session stays open when the claim is rejected.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::WalletNotConnected`],
    /// [`GatewayError::NotEnoughMessages`] below
    /// [`MIN_CLAIM_MESSAGES`] user messages, or
    /// [`GatewayError::SessionNotFound`].
    pub async fn end(&self, id: uuid::Uuid) -> Result<SessionClaim, GatewayError> {
        let snapshot = self.get(id).await?;
        self.wallets.require_connected(&snapshot.wallet).await?;

        let current = snapshot.user_message_count();
        if current < MIN_CLAIM_MESSAGES {
            return Err(GatewayError::NotEnoughMessages {
                required: MIN_CLAIM_MESSAGES,
                current,
            });
        }

        let now = Utc::now();
        let duration_secs = snapshot.duration_secs(now);
        let rewards = rewards::estimate(&snapshot.messages, self.gas);
        let data = conversation_data(&snapshot, &rewards, duration_secs, now.timestamp_millis());

        let (conversation_hash, is_fallback) = match self.pin_transcript(&snapshot, &data).await {
            Ok(hash) => (hash, false),
            Err(e) => {
                tracing::warn!(session_id = %id, error = %e, "transcript pin failed; using fallback hash");
                (
                    format!("chat_{}_{}", now.timestamp_millis(), snapshot.wallet.suffix()),
                    true,
                )
            }
        };

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let quality = rewards.quality_score.floor().max(0.0) as u64;
        let transaction = self.chain.submit_chat_session_tx(
            &conversation_hash,
            rewards.message_count,
            quality,
            duration_secs,
        );

        self.sessions.remove(id).await?;
        tracing::info!(
            session_id = %id,
            wallet = %snapshot.wallet,
            %conversation_hash,
            earnings = rewards.current_earnings,
            "chat session claimed"
        );
        self.event_bus.publish(
            Notification::info("Chat session ready to submit")
                .with_message(format!(
                    "{} messages in {}, earning {} POOL tokens once confirmed",
                    rewards.message_count,
                    format_session_time(duration_secs),
                    rewards.current_earnings
                ))
                .for_wallet(&snapshot.wallet),
        );

        Ok(SessionClaim {
            session_id: id,
            conversation_hash,
            is_fallback,
            rewards,
            duration_secs,
            transaction,
        })
    }

    async fn pin_transcript(
        &self,
        session: &ChatSession,
        data: &ConversationData,
    ) -> Result<String, GatewayError> {
        let content = serde_json::to_string_pretty(data)
            .map_err(|e| GatewayError::Internal(e.to_string()))?;
        let pin = PromptPin {
            title: format!("Pool AI Chat Session - {}", Utc::now().format("%-m/%-d/%Y")),
            content,
            category: PromptCategory::Conversational.as_u8(),
            author: session.wallet.as_str().to_string(),
            submitted_at: data.collected_at,
        };
        let result = self.pinata.pin_prompt(&pin).await?;
        Ok(result.hash)
    }
}

/// Builds the transcript bundle for a claimed session.
#[must_use]
pub fn conversation_data(
    session: &ChatSession,
    rewards: &SessionRewards,
    duration_secs: u64,
    collected_at: i64,
) -> ConversationData {
    ConversationData {
        session_id: format!("session_{collected_at}_{}", session.wallet.suffix()),
        user_address: session.wallet.as_str().to_string(),
        messages: session
            .messages
            .iter()
            .map(|m| ScoredMessage {
                role: m.role,
                content: m.content.clone(),
                timestamp: m.timestamp,
                quality_score: rewards.quality_score,
            })
            .collect(),
        session_stats: SessionStats {
            total_messages: rewards.message_count,
            duration: duration_secs,
            earnings: rewards.current_earnings,
            gas_efficiency: rewards.gas_efficiency,
        },
        privacy_consent: true,
        collected_at,
        platform: PLATFORM,
        version: TRANSCRIPT_VERSION,
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::time::Duration;

    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::{DEFAULT_CONTRACT_ADDRESS, POLYGON_CHAIN_ID};
    use crate::domain::{PromptCache, TransactionTracker};
    use crate::persistence::InMemoryReferralStore;
    use crate::service::ReferralService;

    const WALLET: &str = "0xaaaaaa0000000000000000000000000000000001";

    fn wallet() -> WalletAddress {
        let Ok(w) = WalletAddress::parse(WALLET) else {
            panic!("valid address");
        };
        w
    }

    async fn service(llm_url: &str, llm_key: Option<&str>) -> ChatService {
        let timeout = Duration::from_millis(500);
        let Ok(chain) = ChainClient::new("http://127.0.0.1:9", DEFAULT_CONTRACT_ADDRESS, POLYGON_CHAIN_ID, timeout) else {
            panic!("chain");
        };
        let Ok(llm) = GroqClient::new(llm_url, "test-model", llm_key.map(str::to_string), timeout) else {
            panic!("llm");
        };
        let Ok(pinata) = PinataClient::new("http://127.0.0.1:9", "http://127.0.0.1:9", None, timeout) else {
            panic!("pinata");
        };
        let chain = Arc::new(chain);
        let sessions = Arc::new(SessionRegistry::new());
        let bus = EventBus::new(16);
        let wallets = Arc::new(WalletService::new(
            Arc::clone(&chain),
            ReferralService::new(Arc::new(InMemoryReferralStore::new())),
            Arc::new(PromptCache::new()),
            Arc::clone(&sessions),
            Arc::new(TransactionTracker::new()),
            bus.clone(),
        ));
        let _ = wallets.connect(wallet(), POLYGON_CHAIN_ID, None).await;
        ChatService::new(
            sessions,
            wallets,
            Arc::new(llm),
            Arc::new(pinata),
            chain,
            GasAssumptions::default(),
            bus,
        )
    }

    async fn llm_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "Happy to help!"}}],
                "usage": {"total_tokens": 12}
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn send_appends_both_messages() {
        let server = llm_server().await;
        let chat = service(&server.uri(), Some("key")).await;
        let Ok(session) = chat.start(wallet()).await else {
            panic!("start");
        };

        let Ok(turn) = chat.send(session.id, "What is PromptPool about?").await else {
            panic!("send");
        };
        assert_eq!(turn.reply.content, "Happy to help!");
        assert!(!turn.degraded);
        assert_eq!(turn.rewards.message_count, 1);

        let Ok(after) = chat.get(session.id).await else {
            panic!("get");
        };
        assert_eq!(after.messages.len(), 3);
        assert!(!after.awaiting_reply);
    }

    #[tokio::test]
    async fn provider_failure_appends_apology() {
        let chat = service("http://127.0.0.1:9", None).await;
        let Ok(session) = chat.start(wallet()).await else {
            panic!("start");
        };
        let Ok(turn) = chat.send(session.id, "hello there").await else {
            panic!("send");
        };
        assert!(turn.degraded);
        assert_eq!(turn.reply.content, APOLOGY);
    }

    #[tokio::test]
    async fn blank_and_concurrent_messages_are_rejected() {
        let chat = service("http://127.0.0.1:9", None).await;
        let Ok(session) = chat.start(wallet()).await else {
            panic!("start");
        };
        assert!(matches!(
            chat.send(session.id, "   ").await,
            Err(GatewayError::InvalidRequest(_))
        ));

        if let Ok(lock) = chat.sessions.get(session.id).await {
            lock.write().await.awaiting_reply = true;
        }
        assert!(matches!(
            chat.send(session.id, "second").await,
            Err(GatewayError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn dropped_request_still_completes_the_turn() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_millis(200))
                    .set_body_json(serde_json::json!({
                        "choices": [{"message": {"role": "assistant", "content": "Happy to help!"}}]
                    })),
            )
            .mount(&server)
            .await;
        let chat = Arc::new(service(&server.uri(), Some("key")).await);
        let Ok(session) = chat.start(wallet()).await else {
            panic!("start");
        };

        let pending = {
            let chat = Arc::clone(&chat);
            tokio::spawn(async move { chat.send(session.id, "first message").await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        pending.abort();
        tokio::time::sleep(Duration::from_millis(400)).await;

        let Ok(after) = chat.get(session.id).await else {
            panic!("get");
        };
        assert!(!after.awaiting_reply);
        assert_eq!(after.messages.len(), 3);

        let Ok(turn) = chat.send(session.id, "second message").await else {
            panic!("second send rejected");
        };
        assert!(!turn.degraded);
        assert_eq!(turn.rewards.message_count, 2);
    }

    #[tokio::test]
    async fn end_requires_five_user_messages() {
        let server = llm_server().await;
        let chat = service(&server.uri(), Some("key")).await;
        let Ok(session) = chat.start(wallet()).await else {
            panic!("start");
        };
        for i in 0..4 {
            let _ = chat.send(session.id, &format!("message number {i}")).await;
        }
        let err = chat.end(session.id).await;
        let Err(GatewayError::NotEnoughMessages { required, current }) = err else {
            panic!("expected rejection");
        };
        assert_eq!((required, current), (5, 4));
        assert!(chat.get(session.id).await.is_ok());
    }

    #[tokio::test]
    async fn end_falls_back_to_local_hash_and_closes_session() {
        let server = llm_server().await;
        let chat = service(&server.uri(), Some("key")).await;
        let Ok(session) = chat.start(wallet()).await else {
            panic!("start");
        };
        for i in 0..5 {
            let _ = chat
                .send(session.id, &format!("a reasonably detailed question number {i}"))
                .await;
        }

        let Ok(claim) = chat.end(session.id).await else {
            panic!("claim");
        };
        assert!(claim.is_fallback);
        assert!(claim.conversation_hash.starts_with("chat_"));
        assert!(claim.conversation_hash.ends_with("000001"));
        assert_eq!(claim.rewards.message_count, 5);
        assert_eq!(claim.transaction.function_name, "submitChatSession");
        assert!(chat.get(session.id).await.is_err());
    }

    #[test]
    fn transcript_session_id_uses_address_suffix() {
        let session = ChatSession::new(wallet());
        let rewards = rewards::estimate(&session.messages, GasAssumptions::default());
        let data = conversation_data(&session, &rewards, 30, 1_700_000_000_000);
        assert_eq!(data.session_id, "session_1700000000000_000001");
        assert!(data.privacy_consent);
        assert_eq!(data.messages.len(), 1);
    }
}
