//! REST API layer: route handlers, DTOs, the OpenAPI document and
//! router composition.
//!
//! Versioned endpoints are mounted under `/api/v1`; the legacy `/api/*`
//! endpoints and system routes sit at the root.

pub mod dto;
pub mod handlers;
pub mod openapi;

use axum::Router;
#[cfg(not(feature = "swagger-ui"))]
use axum::{Json, routing::get};
use utoipa::OpenApi;

use crate::app_state::AppState;
use openapi::ApiDoc;

/// Path the OpenAPI JSON is served at.
pub const OPENAPI_PATH: &str = "/api-docs/openapi.json";

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::legacy::routes())
        .merge(handlers::system::routes())
        .merge(docs_router())
}

#[cfg(feature = "swagger-ui")]
fn docs_router() -> Router<AppState> {
    Router::new().merge(
        utoipa_swagger_ui::SwaggerUi::new("/swagger-ui").url(OPENAPI_PATH, ApiDoc::openapi()),
    )
}

#[cfg(not(feature = "swagger-ui"))]
fn docs_router() -> Router<AppState> {
    let doc = ApiDoc::openapi();
    Router::new().route(
        OPENAPI_PATH,
        get(move || {
            let doc = doc.clone();
            async move { Json(doc) }
        }),
    )
}

#[cfg(test)]
#[allow(clippy::panic)]
pub(crate) mod testing {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::build_router;
    use crate::app_state::AppState;
    use crate::config::GatewayConfig;
    use crate::persistence::InMemoryReferralStore;

    /// State over an in-memory referral store.
    pub(crate) async fn state_with(config: GatewayConfig) -> AppState {
        let Ok(state) = AppState::build(config, Arc::new(InMemoryReferralStore::new())).await
        else {
            panic!("state should build");
        };
        state
    }

    async fn send(state: AppState, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let app = build_router().with_state(state);
        let Ok(response) = app.oneshot(request).await else {
            panic!("router is infallible");
        };
        let status = response.status();
        let Ok(bytes) = axum::body::to_bytes(response.into_body(), usize::MAX).await else {
            panic!("body should be readable");
        };
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, body)
    }

    pub(crate) async fn get_json(state: AppState, uri: &str) -> (StatusCode, serde_json::Value) {
        let Ok(request) = Request::get(uri).body(Body::empty()) else {
            panic!("valid request");
        };
        send(state, request).await
    }

    pub(crate) async fn post_json(
        state: AppState,
        uri: &str,
        body: serde_json::Value,
    ) -> (StatusCode, serde_json::Value) {
        post_raw(state, uri, body.to_string()).await
    }

    /// Posts `body` verbatim with a JSON content type.
    pub(crate) async fn post_raw(
        state: AppState,
        uri: &str,
        body: String,
    ) -> (StatusCode, serde_json::Value) {
        let Ok(request) = Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
        else {
            panic!("valid request");
        };
        send(state, request).await
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::StatusCode;
    use wiremock::matchers::{body_partial_json, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::testing::{get_json, post_json, state_with};
    use crate::config::GatewayConfig;

    const ALICE: &str = "0x2d6048916fd4017d9348563d442a3476a710d335";
    const BOB: &str = "0xbbbbbb0000000000000000000000000000000002";

    /// Answers every JSON-RPC call with a zero balance / empty result.
    async fn rpc_server() -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({ "method": "eth_getBalance" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "jsonrpc": "2.0", "id": 1, "result": "0xde0b6b3a7640000",
            })))
            .mount(&server)
            .await;
        server
    }

    #[tokio::test]
    async fn health_reports_version() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let (status, body) = get_json(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
        assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn client_config_flags_demo_mode() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let (status, body) = get_json(state, "/config/client").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chain_id"], 137);
        assert_eq!(body["ipfs_demo_mode"], true);
        assert_eq!(body["ai_configured"], false);
    }

    #[tokio::test]
    async fn categories_are_listed_in_chain_order() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let (_, body) = get_json(state, "/config/categories").await;
        assert_eq!(body.as_array().map(Vec::len), Some(6));
        assert_eq!(body[3]["label"], "Conversational");
    }

    #[tokio::test]
    async fn connect_rejects_unsupported_chain() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let (status, body) = post_json(
            state,
            "/api/v1/wallets/connect",
            serde_json::json!({ "address": ALICE, "chainId": 1 }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1003);
    }

    #[tokio::test]
    async fn short_prompt_is_rejected_before_pinning() {
        let server = rpc_server().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let (status, _) = post_json(
            state.clone(),
            "/api/v1/wallets/connect",
            serde_json::json!({ "address": ALICE, "chainId": 137 }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = post_json(
            state,
            "/api/v1/prompts",
            serde_json::json!({
                "title": "Short", "content": "too short", "category": 0, "author": ALICE,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], 1001);
        let pins = server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.url.path().contains("pinning"))
            .count();
        assert_eq!(pins, 0);
    }

    #[tokio::test]
    async fn submit_then_disconnect_clears_cached_prompts() {
        let server = rpc_server().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let _ = post_json(
            state.clone(),
            "/api/v1/wallets/connect",
            serde_json::json!({ "address": ALICE, "chainId": 137 }),
        )
        .await;

        let (status, body) = post_json(
            state.clone(),
            "/api/v1/prompts",
            serde_json::json!({
                "title": "Tides",
                "content": "Write a haiku about the tides of the Pacific",
                "category": 0,
                "author": ALICE,
            }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["prompt"]["is_demo"], true);
        assert_eq!(body["transaction"]["functionName"], "submitPrompt");

        let uri = format!("/api/v1/prompts?wallet={ALICE}");
        let (_, listed) = get_json(state.clone(), &uri).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(1));

        let (status, summary) = post_json(
            state.clone(),
            &format!("/api/v1/wallets/{ALICE}/disconnect"),
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["prompts_cleared"], 1);

        let (_, listed) = get_json(state, &uri).await;
        assert_eq!(listed.as_array().map(Vec::len), Some(0));
    }

    #[tokio::test]
    async fn chat_end_below_five_messages_is_rejected() {
        let server = rpc_server().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let _ = post_json(
            state.clone(),
            "/api/v1/wallets/connect",
            serde_json::json!({ "address": ALICE, "chainId": 137 }),
        )
        .await;
        let (status, session) = post_json(
            state.clone(),
            "/api/v1/chat/sessions",
            serde_json::json!({ "wallet": ALICE }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(session["messages"].as_array().map(Vec::len), Some(1));

        let id = session["id"].as_str().unwrap_or_default().to_string();
        let (status, body) = post_json(
            state,
            &format!("/api/v1/chat/sessions/{id}/end"),
            serde_json::json!({}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["error"]["message"],
            "Need at least 5 messages to claim rewards! Currently: 0"
        );
    }

    #[tokio::test]
    async fn reward_estimate_is_pure() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let messages: Vec<serde_json::Value> = (0..4)
            .map(|_| serde_json::json!({ "role": "user", "content": "x".repeat(100) }))
            .collect();
        let (status, body) = post_json(
            state,
            "/api/v1/rewards/estimate",
            serde_json::json!({ "messages": messages }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message_count"], 4);
        assert_eq!(body["conversation_bonus"], 1.2);
    }

    #[tokio::test]
    async fn referral_flow_over_http() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let (status, user) = post_json(
            state.clone(),
            "/api/v1/referrals/users",
            serde_json::json!({ "address": ALICE }),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(user["referral_code"], "2D6048");

        let (_, tracked) = post_json(
            state.clone(),
            "/api/v1/referrals",
            serde_json::json!({ "referee": BOB, "referral_code": "2d6048" }),
        )
        .await;
        assert_eq!(tracked["tracked"], true);

        let (_, again) = post_json(
            state.clone(),
            "/api/v1/referrals",
            serde_json::json!({ "referee": ALICE, "referral_code": "2D6048" }),
        )
        .await;
        assert_eq!(again["tracked"], false);
        assert_eq!(again["reason"], "self_referral");

        let (_, paid) = post_json(
            state.clone(),
            "/api/v1/referrals/payments",
            serde_json::json!({ "referee": BOB, "prompt_submission_id": "p-1", "bonus_amount": 2.0 }),
        )
        .await;
        assert_eq!(paid["paid"], true);

        let (status, stats) = get_json(state, &format!("/api/v1/referrals/stats/{ALICE}")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(stats["total_referrals"], 1);
        assert_eq!(stats["total_earnings"], 2.0);
    }

    #[tokio::test]
    async fn unknown_transaction_is_404() {
        let state = state_with(GatewayConfig::for_upstream("http://127.0.0.1:9")).await;
        let hash = format!("0x{}", "a".repeat(64));
        let (status, body) = get_json(state, &format!("/api/v1/transactions/{hash}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"]["code"], 2003);
    }
}
