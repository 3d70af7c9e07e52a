//! System endpoints: health check and client configuration.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::dto::CategoryInfo;
use crate::app_state::AppState;
use crate::domain::PromptCategory;
use crate::domain::chat::MIN_CLAIM_MESSAGES;
use crate::domain::prompt::MIN_PROMPT_LENGTH;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health` — Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Returns service health status, version, and current timestamp.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    )
)]
pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// Settings a browser client needs to talk to the contract.
#[derive(Debug, Serialize, ToSchema)]
pub struct ClientConfig {
    contract_address: String,
    chain_id: u64,
    walletconnect_project_id: String,
    /// `true` when uploads return simulated hashes.
    ipfs_demo_mode: bool,
    ai_configured: bool,
    gas_cost_usd: f64,
    pool_price_usd: f64,
    min_prompt_length: usize,
    min_claim_messages: usize,
}

/// `GET /config/client` — Contract address, chain and demo flags.
#[utoipa::path(
    get,
    path = "/config/client",
    tag = "System",
    summary = "Client configuration",
    description = "Contract address, chain id, WalletConnect project id and which integrations run in demo mode.",
    responses(
        (status = 200, description = "Client configuration", body = ClientConfig),
    )
)]
pub async fn client_config_handler(State(state): State<AppState>) -> impl IntoResponse {
    let config = &state.config;
    Json(ClientConfig {
        contract_address: state.chain.contract_address(),
        chain_id: state.chain.chain_id(),
        walletconnect_project_id: config.walletconnect_project_id.clone(),
        ipfs_demo_mode: !state.pinata.is_configured(),
        ai_configured: state.llm.is_configured(),
        gas_cost_usd: config.gas_cost_usd,
        pool_price_usd: config.pool_price_usd,
        min_prompt_length: MIN_PROMPT_LENGTH,
        min_claim_messages: MIN_CLAIM_MESSAGES,
    })
}

/// `GET /config/categories` — Prompt categories in on-chain order.
#[utoipa::path(
    get,
    path = "/config/categories",
    tag = "System",
    summary = "List prompt categories",
    responses(
        (status = 200, description = "Category catalog", body = Vec<CategoryInfo>),
    )
)]
pub async fn categories_handler() -> impl IntoResponse {
    let categories: Vec<CategoryInfo> = PromptCategory::ALL
        .iter()
        .map(|c| CategoryInfo {
            id: c.as_u8(),
            label: c.label(),
        })
        .collect();
    Json(categories)
}

/// System routes mounted at the root level (not under /api/v1).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/config/client", get(client_config_handler))
        .route("/config/categories", get(categories_handler))
}
