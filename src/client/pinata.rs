//! Pinata IPFS pinning client.
//!
//! Pins prompt metadata as JSON and fetches pinned objects back through a
//! list of public gateways. When no JWT is configured, or when pinning
//! fails and the caller opts into the fallback, a simulated `Qm…` hash is
//! produced and the result is flagged as demo mode.

use std::fmt;
use std::time::Duration;

use chrono::Utc;
use rand::seq::SliceRandom;
use reqwest::{Client, header};
use serde::{Deserialize, Serialize};

/// Public gateway used for simulated hashes.
pub const DEMO_GATEWAY: &str = "https://ipfs.io";

/// Timeout for each gateway during retrieval.
pub const GATEWAY_TIMEOUT: Duration = Duration::from_secs(10);

/// Public gateways tried after the configured one, in order.
pub const PUBLIC_GATEWAYS: [&str; 3] = [
    "https://ipfs.io",
    "https://cloudflare-ipfs.com",
    "https://dweb.link",
];

const BASE58_ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Errors from the pinning provider.
#[derive(Debug, thiserror::Error)]
pub enum PinError {
    /// No JWT configured.
    #[error("IPFS service not configured")]
    NotConfigured,

    /// The request never got a response.
    #[error("network error: {0}")]
    Network(String),

    /// The provider answered with a non-success status.
    #[error("IPFS upload failed: {status} {body}")]
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

/// Prompt metadata to pin.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptPin {
    /// Prompt title.
    pub title: String,
    /// Prompt body (or a serialized chat transcript).
    pub content: String,
    /// Category discriminant.
    pub category: u8,
    /// Author address.
    pub author: String,
    /// Unix timestamp in milliseconds.
    pub submitted_at: i64,
}

/// Outcome of a pin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PinResult {
    /// Content hash.
    pub hash: String,
    /// Public gateway URL.
    pub url: String,
    /// The hash was simulated.
    pub is_demo: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinRequest<'a> {
    pinata_content: PinnedObject<'a>,
    pinata_metadata: PinMetadata,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PinnedObject<'a> {
    #[serde(flatten)]
    prompt: &'a PromptPin,
    version: &'static str,
    platform: &'static str,
    timestamp: i64,
}

#[derive(Debug, Serialize)]
struct PinMetadata {
    name: String,
    keyvalues: PinKeyValues,
}

#[derive(Debug, Serialize)]
struct PinKeyValues {
    category: String,
    author: String,
    platform: &'static str,
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct PinResponse {
    #[serde(rename = "IpfsHash")]
    ipfs_hash: String,
}

/// Client for Pinata's `pinJSONToIPFS` endpoint and IPFS gateways.
#[derive(Clone)]
pub struct PinataClient {
    client: Client,
    api_url: String,
    gateway_url: String,
    jwt: Option<String>,
    fetch_gateways: Vec<String>,
}

impl fmt::Debug for PinataClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinataClient")
            .field("api_url", &self.api_url)
            .field("gateway_url", &self.gateway_url)
            .field("configured", &self.jwt.is_some())
            .finish_non_exhaustive()
    }
}

impl PinataClient {
    /// Creates a client. Retrieval tries `gateway_url` first, then the
    /// [`PUBLIC_GATEWAYS`].
    ///
    /// # Errors
    ///
    /// Returns [`PinError::Network`] if the HTTP client cannot be built.
    pub fn new(
        api_url: impl Into<String>,
        gateway_url: impl Into<String>,
        jwt: Option<String>,
        timeout: Duration,
    ) -> Result<Self, PinError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PinError::Network(e.to_string()))?;
        let gateway_url = gateway_url.into().trim_end_matches('/').to_string();
        let mut fetch_gateways = vec![gateway_url.clone()];
        fetch_gateways.extend(
            PUBLIC_GATEWAYS
                .iter()
                .map(|g| (*g).to_string())
                .filter(|g| *g != gateway_url),
        );
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            gateway_url,
            jwt,
            fetch_gateways,
        })
    }

    /// Replaces the retrieval gateway list.
    #[must_use]
    pub fn with_fetch_gateways(mut self, gateways: Vec<String>) -> Self {
        self.fetch_gateways = gateways;
        self
    }

    /// Whether a JWT is configured.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        self.jwt.is_some()
    }

    /// Pins the prompt as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`PinError::NotConfigured`] without a JWT, or the provider
    /// failure otherwise.
    pub async fn pin_prompt(&self, prompt: &PromptPin) -> Result<PinResult, PinError> {
        let jwt = self.jwt.as_deref().ok_or(PinError::NotConfigured)?;

        let request = PinRequest {
            pinata_content: PinnedObject {
                prompt,
                version: "1.0",
                platform: "PromptPool",
                timestamp: Utc::now().timestamp_millis(),
            },
            pinata_metadata: PinMetadata {
                name: pin_name(&prompt.title),
                keyvalues: PinKeyValues {
                    category: prompt.category.to_string(),
                    author: prompt.author.clone(),
                    platform: "PromptPool",
                    kind: "ai-prompt",
                },
            },
        };

        let response = self
            .client
            .post(format!("{}/pinning/pinJSONToIPFS", self.api_url))
            .header(header::AUTHORIZATION, format!("Bearer {jwt}"))
            .json(&request)
            .send()
            .await
            .map_err(|e| PinError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "pinning provider error");
            return Err(PinError::RequestFailed {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: PinResponse = response
            .json()
            .await
            .map_err(|e| PinError::Parse(e.to_string()))?;
        tracing::info!(hash = %parsed.ipfs_hash, "prompt pinned");
        Ok(PinResult {
            url: format!("{}/ipfs/{}", self.gateway_url, parsed.ipfs_hash),
            hash: parsed.ipfs_hash,
            is_demo: false,
        })
    }

    /// Pins the prompt, falling back to a simulated hash when unconfigured
    /// or when the provider fails.
    pub async fn pin_or_simulate(&self, prompt: &PromptPin) -> PinResult {
        match self.pin_prompt(prompt).await {
            Ok(result) => result,
            Err(PinError::NotConfigured) => {
                tracing::debug!("pinning not configured; using demo hash");
                simulate_pin()
            }
            Err(e) => {
                tracing::warn!(error = %e, "pinning failed; using demo hash");
                simulate_pin()
            }
        }
    }

    /// Fetches a pinned JSON object, trying each gateway in turn.
    ///
    /// Returns `None` when every gateway fails.
    pub async fn fetch(&self, hash: &str) -> Option<serde_json::Value> {
        for gateway in &self.fetch_gateways {
            let url = format!("{gateway}/ipfs/{hash}");
            let result = self
                .client
                .get(&url)
                .header(header::ACCEPT, "application/json")
                .timeout(GATEWAY_TIMEOUT)
                .send()
                .await;
            match result {
                Ok(resp) if resp.status().is_success() => match resp.json().await {
                    Ok(value) => return Some(value),
                    Err(e) => tracing::warn!(%url, error = %e, "gateway returned invalid JSON"),
                },
                Ok(resp) => tracing::warn!(%url, status = resp.status().as_u16(), "gateway failed"),
                Err(e) => tracing::warn!(%url, error = %e, "gateway failed"),
            }
        }
        tracing::error!(%hash, "all IPFS gateways failed");
        None
    }
}

/// Pin name derived from the title: `PromptPool-` followed by the title
/// with every non-alphanumeric character replaced by `-`.
#[must_use]
pub fn pin_name(title: &str) -> String {
    let sanitized: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    format!("PromptPool-{sanitized}")
}

/// Produces a simulated pin result for demo mode.
#[must_use]
pub fn simulate_pin() -> PinResult {
    let hash = simulated_hash();
    PinResult {
        url: format!("{DEMO_GATEWAY}/ipfs/{hash}"),
        hash,
        is_demo: true,
    }
}

/// Generates a random CIDv0-shaped hash: `Qm` plus 44 base58 characters.
#[must_use]
pub fn simulated_hash() -> String {
    let mut rng = rand::thread_rng();
    let tail: String = (0..44)
        .filter_map(|_| BASE58_ALPHABET.choose(&mut rng))
        .map(|&b| char::from(b))
        .collect();
    format!("Qm{tail}")
}

/// Checks the CIDv0 shape: `Qm` followed by 44 base58 characters.
#[must_use]
pub fn is_valid_ipfs_hash(hash: &str) -> bool {
    hash.strip_prefix("Qm").is_some_and(|rest| {
        rest.len() == 44 && rest.bytes().all(|b| BASE58_ALPHABET.contains(&b))
    })
}
