//! Groq (OpenAI-compatible) chat completion client.
//!
//! Builds the Pool AI conversation (system prompt, trimmed history, new
//! user message) and forwards it to `/chat/completions`. Failures are
//! returned as-is; there is no retry.

use std::fmt;
use std::time::Duration;

use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

use crate::domain::{ChatMessage, ChatRole};

/// Number of prior messages forwarded for context.
pub const HISTORY_WINDOW: usize = 6;

/// Message used by the diagnostic endpoint.
pub const SELF_TEST_MESSAGE: &str = r#"Hello! Please respond with exactly: "PromptPool AI is working!""#;

/// System prompt for the first turn of a conversation.
pub const WELCOME_SYSTEM_PROMPT: &str = "You are Pool AI, the helpful assistant for PromptPool - the world's first AI that pays users to chat! \n\nWelcome! You're earning POOL tokens just by chatting with me - how cool is that? PromptPool is revolutionary because instead of paying monthly fees like other AI services, users get PAID to have conversations.\n\nKey facts:\n- You earn POOL tokens for every message\n- Built on Polygon blockchain with smart contracts\n- Community-owned AI that gets smarter over time\n\nNow, what can I help you with today?";

/// System prompt for every later turn.
pub const FOLLOW_UP_SYSTEM_PROMPT: &str = "You are Pool AI, the helpful assistant for PromptPool. Be genuinely helpful, friendly, and knowledgeable. Keep responses concise but informative (1-3 paragraphs max). Focus on answering their questions well - no need to mention POOL tokens or earnings.";

/// Errors from the LLM provider.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// No API key configured.
    #[error("AI service not configured")]
    NotConfigured,

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("HTTP error! status: {status} - {body}")]
    RequestFailed {
        /// HTTP status code.
        status: u16,
        /// Response body, verbatim.
        body: String,
    },

    /// The response did not have the expected shape.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Sampling parameters for one completion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionParams {
    /// Maximum tokens to generate.
    pub max_tokens: u32,
    /// Sampling temperature.
    pub temperature: f32,
    /// Nucleus sampling cutoff.
    pub top_p: Option<f32>,
}

impl CompletionParams {
    /// Parameters used for regular chat turns.
    pub const CHAT: Self = Self {
        max_tokens: 500,
        temperature: 0.7,
        top_p: Some(0.9),
    };

    /// Parameters used by the diagnostic endpoint.
    pub const SELF_TEST: Self = Self {
        max_tokens: 50,
        temperature: 0.1,
        top_p: None,
    };
}

/// A message in the provider's wire format (role and content only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WireMessage {
    /// `system`, `user` or `assistant`.
    pub role: &'static str,
    /// Message text.
    pub content: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [WireMessage],
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: MessageResponse,
}

#[derive(Debug, Deserialize)]
struct MessageResponse {
    content: Option<String>,
}

/// A successful completion.
#[derive(Debug, Clone)]
pub struct ChatCompletion {
    /// Assistant reply.
    pub content: String,
    /// Provider usage statistics, passed through untouched.
    pub usage: serde_json::Value,
    /// The full provider response.
    pub raw: serde_json::Value,
}

/// Client for an OpenAI-compatible chat completion API.
#[derive(Clone)]
pub struct GroqClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl fmt::Debug for GroqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroqClient")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("configured", &self.api_key.is_some())
            .finish_non_exhaustive()
    }
}

impl GroqClient {
    /// Creates a client.
    ///
    /// # Errors
    ///
    /// Returns [`LlmError::Network`] if the HTTP client cannot be built.
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmError::Network(e.to_string()))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            model: model.into(),
        })
    }

    /// Whether an API key is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Sends one chat turn with the Pool AI system prompt and the last
    /// [`HISTORY_WINDOW`] messages of history.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when unconfigured or when the provider fails.
    pub async fn chat(
        &self,
        message: &str,
        history: &[ChatMessage],
    ) -> Result<ChatCompletion, LlmError> {
        let messages = build_messages(message, history);
        tracing::info!(
            message_length = message.chars().count(),
            history_length = history.len(),
            first_message = history.is_empty(),
            "processing chat request"
        );
        let completion = self.complete(&messages, CompletionParams::CHAT).await?;
        tracing::info!(usage = %completion.usage, "chat completion succeeded");
        Ok(completion)
    }

    /// Sends the fixed diagnostic message.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when unconfigured or when the provider fails.
    pub async fn self_test(&self) -> Result<ChatCompletion, LlmError> {
        let messages = [WireMessage {
            role: ChatRole::User.as_str(),
            content: SELF_TEST_MESSAGE.to_string(),
        }];
        self.complete(&messages, CompletionParams::SELF_TEST).await
    }

    /// Posts a raw completion request.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] when unconfigured or when the provider fails.
    pub async fn complete(
        &self,
        messages: &[WireMessage],
        params: CompletionParams,
    ) -> Result<ChatCompletion, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::NotConfigured)?;

        let request = ChatRequest {
            model: &self.model,
            messages,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            top_p: params.top_p,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header(header::AUTHORIZATION, format!("Bearer {api_key}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "LLM provider error");
            return Err(LlmError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let raw: serde_json::Value = response
            .json()
            .await
            .map_err(|e| LlmError::Parse(e.to_string()))?;
        let parsed: ChatResponse =
            serde_json::from_value(raw.clone()).map_err(|e| LlmError::Parse(e.to_string()))?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| LlmError::Parse("no choices in response".to_string()))?;

        Ok(ChatCompletion {
            content,
            usage: parsed.usage,
            raw,
        })
    }
}

/// Builds the provider message list: system prompt, the last
/// [`HISTORY_WINDOW`] history entries stripped to role and content, then
/// the new user message.
#[must_use]
pub fn build_messages(message: &str, history: &[ChatMessage]) -> Vec<WireMessage> {
    let system_prompt = if history.is_empty() {
        WELCOME_SYSTEM_PROMPT
    } else {
        FOLLOW_UP_SYSTEM_PROMPT
    };
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    let recent = history.get(start..).unwrap_or_default();

    let mut messages = Vec::with_capacity(recent.len() + 2);
    messages.push(WireMessage {
        role: ChatRole::System.as_str(),
        content: system_prompt.to_string(),
    });
    messages.extend(recent.iter().map(|m| WireMessage {
        role: m.role.as_str(),
        content: m.content.clone(),
    }));
    messages.push(WireMessage {
        role: ChatRole::User.as_str(),
        content: message.to_string(),
    });
    messages
}
