//! Legacy endpoints kept at their original paths: `/api/chat-groq`,
//! `/api/test-groq` and `/api/upload-to-ipfs`.
//!
//! These answer with the `{success, error}` envelope instead of
//! [`crate::error::ErrorResponse`].

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;

use crate::api::dto::{
    ChatGroqRequest, ChatGroqResponse, LegacyError, TestGroqResponse, UploadRequest,
    UploadResponse,
};
use crate::app_state::AppState;
use crate::client::groq::LlmError;
use crate::client::pinata::simulate_pin;
use crate::client::{PinError, PromptPin};
use crate::domain::ChatMessage;

fn failure(status: StatusCode, body: LegacyError) -> Response {
    (status, Json(body)).into_response()
}

/// `POST /api/chat-groq` — One Pool AI chat turn.
#[utoipa::path(
    post,
    path = "/api/chat-groq",
    tag = "Legacy",
    summary = "Chat with Pool AI",
    description = "Proxies one message plus the last six history entries to the LLM provider. The welcome system prompt is used only when the history is empty.",
    request_body = ChatGroqRequest,
    responses(
        (status = 200, description = "Assistant reply", body = ChatGroqResponse),
        (status = 400, description = "Message is required", body = LegacyError),
        (status = 500, description = "Not configured, provider failure or unreadable body", body = LegacyError),
    )
)]
pub async fn chat_groq(
    State(state): State<AppState>,
    body: Result<Json<ChatGroqRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => {
            tracing::error!(error = %rejection.body_text(), "chat request body rejected");
            return failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                LegacyError::new("Internal server error"),
            );
        }
    };
    let Some(message) = req.message.filter(|m| !m.trim().is_empty()) else {
        return failure(StatusCode::BAD_REQUEST, LegacyError::new("Message is required"));
    };
    let history: Vec<ChatMessage> = req
        .conversation_history
        .into_iter()
        .map(ChatMessage::from)
        .collect();

    match state.llm.chat(&message, &history).await {
        Ok(completion) => Json(ChatGroqResponse {
            success: true,
            message: completion.content,
            usage: completion.usage,
        })
        .into_response(),
        Err(LlmError::NotConfigured) => {
            tracing::error!("GROQ_API_KEY not set");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                LegacyError::new("AI service not configured"),
            )
        }
        Err(e) => {
            tracing::error!(error = %e, "chat proxy failed");
            failure(
                StatusCode::INTERNAL_SERVER_ERROR,
                LegacyError::new("AI service temporarily unavailable"),
            )
        }
    }
}

/// `GET /api/test-groq` — Provider connectivity check.
#[utoipa::path(
    get,
    path = "/api/test-groq",
    tag = "Legacy",
    summary = "Test the LLM provider",
    description = "Sends a fixed diagnostic message. Provider failures are returned with the upstream status and body.",
    responses(
        (status = 200, description = "Provider answered", body = TestGroqResponse),
        (status = 500, description = "Not configured or provider failure", body = LegacyError),
    )
)]
pub async fn test_groq(State(state): State<AppState>) -> Response {
    match state.llm.self_test().await {
        Ok(completion) => {
            tracing::info!(reply = %completion.content, "provider self-test succeeded");
            Json(TestGroqResponse {
                success: true,
                message: completion.content,
                full_response: completion.raw,
            })
            .into_response()
        }
        Err(LlmError::NotConfigured) => failure(
            StatusCode::INTERNAL_SERVER_ERROR,
            LegacyError::new("API key not configured"),
        ),
        Err(e) => {
            tracing::error!(error = %e, "provider self-test failed");
            failure(StatusCode::INTERNAL_SERVER_ERROR, LegacyError::new(e.to_string()))
        }
    }
}

/// `POST /api/upload-to-ipfs` — Pin a prompt as JSON.
#[utoipa::path(
    post,
    path = "/api/upload-to-ipfs",
    tag = "Legacy",
    summary = "Upload a prompt to IPFS",
    description = "Pins the prompt through Pinata. Without a JWT a simulated hash is returned with `isDemo: true`.",
    request_body = UploadRequest,
    responses(
        (status = 200, description = "Pinned, or demo hash", body = UploadResponse),
        (status = 400, description = "Missing required fields", body = LegacyError),
        (status = 500, description = "Upload failed or unreadable body", body = LegacyError),
    )
)]
pub async fn upload_to_ipfs(
    State(state): State<AppState>,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> Response {
    let req = match body {
        Ok(Json(req)) => req,
        Err(rejection) => return upload_failed(rejection.body_text()),
    };
    let present = |field: &Option<String>| field.as_deref().is_some_and(|v| !v.is_empty());
    let (true, true, true) = (present(&req.title), present(&req.content), present(&req.author))
    else {
        return failure(
            StatusCode::BAD_REQUEST,
            LegacyError::new("Missing required fields: title, content, author"),
        );
    };

    let pin = PromptPin {
        title: req.title.unwrap_or_default(),
        content: req.content.unwrap_or_default(),
        category: req.category,
        author: req.author.unwrap_or_default(),
        submitted_at: req.submitted_at.unwrap_or_else(|| Utc::now().timestamp_millis()),
    };

    match state.pinata.pin_prompt(&pin).await {
        Ok(result) => Json(UploadResponse {
            success: true,
            hash: result.hash,
            url: result.url,
            is_demo: false,
            message: None,
        })
        .into_response(),
        Err(PinError::NotConfigured) => {
            let demo = simulate_pin();
            tracing::info!(hash = %demo.hash, "pinning not configured; returning demo hash");
            Json(UploadResponse {
                success: true,
                hash: demo.hash,
                url: demo.url,
                is_demo: true,
                message: Some(PinError::NotConfigured.to_string()),
            })
            .into_response()
        }
        Err(e) => upload_failed(e.to_string()),
    }
}

fn upload_failed(detail: String) -> Response {
    tracing::error!(error = %detail, "IPFS upload failed");
    let mut body = LegacyError::new("Upload failed").with_message(detail);
    body.is_demo = Some(false);
    failure(StatusCode::INTERNAL_SERVER_ERROR, body)
}

/// Legacy routes, mounted at the root.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/chat-groq", post(chat_groq))
        .route("/api/test-groq", get(test_groq))
        .route("/api/upload-to-ipfs", post(upload_to_ipfs))
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use axum::http::StatusCode;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::testing::{get_json, post_json, post_raw, state_with};
    use crate::config::GatewayConfig;

    #[tokio::test]
    async fn chat_rejects_blank_message() {
        let server = MockServer::start().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let (status, body) =
            post_json(state, "/api/chat-groq", serde_json::json!({ "message": "  " })).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Message is required");
    }

    #[tokio::test]
    async fn unreadable_bodies_keep_the_legacy_envelope() {
        let server = MockServer::start().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;

        let (status, body) =
            post_raw(state.clone(), "/api/chat-groq", "{not json".to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Internal server error");

        let (status, body) = post_raw(state, "/api/upload-to-ipfs", "[1, 2".to_string()).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");
        assert_eq!(body["isDemo"], false);
        assert!(body["message"].as_str().is_some_and(|m| !m.is_empty()));
    }

    #[tokio::test]
    async fn chat_without_key_is_not_configured() {
        let server = MockServer::start().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let (status, body) =
            post_json(state, "/api/chat-groq", serde_json::json!({ "message": "hi" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "AI service not configured");
    }

    #[tokio::test]
    async fn chat_forwards_history_and_returns_usage() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test-key"))
            .and(body_partial_json(serde_json::json!({
                "model": "llama-3.1-8b-instant",
                "max_tokens": 500,
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{ "message": { "content": "Hello there" } }],
                "usage": { "prompt_tokens": 12, "completion_tokens": 3 },
            })))
            .mount(&server)
            .await;

        let mut config = GatewayConfig::for_upstream(&server.uri());
        config.groq_api_key = Some("test-key".to_string());
        let state = state_with(config).await;
        let (status, body) = post_json(
            state,
            "/api/chat-groq",
            serde_json::json!({
                "message": "And then?",
                "conversationHistory": [
                    { "role": "user", "content": "Hi", "timestamp": "2024-01-01T00:00:00Z" },
                    { "role": "assistant", "content": "Hello!" },
                ],
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "Hello there");
        assert_eq!(body["usage"]["prompt_tokens"], 12);
    }

    #[tokio::test]
    async fn chat_provider_failure_is_temporarily_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;
        let mut config = GatewayConfig::for_upstream(&server.uri());
        config.groq_api_key = Some("test-key".to_string());
        let state = state_with(config).await;
        let (status, body) =
            post_json(state, "/api/chat-groq", serde_json::json!({ "message": "hi" })).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "AI service temporarily unavailable");
    }

    #[tokio::test]
    async fn test_groq_reports_provider_status_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
            .mount(&server)
            .await;
        let mut config = GatewayConfig::for_upstream(&server.uri());
        config.groq_api_key = Some("bad".to_string());
        let state = state_with(config).await;
        let (status, body) = get_json(state, "/api/test-groq").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "HTTP error! status: 401 - invalid api key");
    }

    #[tokio::test]
    async fn upload_requires_title_content_author() {
        let server = MockServer::start().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let (status, body) = post_json(
            state,
            "/api/upload-to-ipfs",
            serde_json::json!({ "title": "T", "content": "" , "author": "0xabc" }),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Missing required fields: title, content, author");
    }

    #[tokio::test]
    async fn upload_without_jwt_returns_demo_hash() {
        let server = MockServer::start().await;
        let state = state_with(GatewayConfig::for_upstream(&server.uri())).await;
        let (status, body) = post_json(
            state,
            "/api/upload-to-ipfs",
            serde_json::json!({
                "title": "Haiku", "content": "Write a haiku about tides", "category": 0,
                "author": "0x2D6048916FD4017D9348563d442a3476a710D335",
            }),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isDemo"], true);
        let hash = body["hash"].as_str().unwrap_or_default();
        assert!(hash.starts_with("Qm"));
        assert!(body["url"].as_str().is_some_and(|u| u.starts_with("https://ipfs.io/ipfs/Qm")));
    }

    #[tokio::test]
    async fn upload_provider_failure_is_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/pinning/pinJSONToIPFS"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let mut config = GatewayConfig::for_upstream(&server.uri());
        config.pinata_jwt = Some("jwt".to_string());
        let state = state_with(config).await;
        let (status, body) = post_json(
            state,
            "/api/upload-to-ipfs",
            serde_json::json!({ "title": "T", "content": "C", "author": "A" }),
        )
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Upload failed");
        assert_eq!(body["isDemo"], false);
        assert!(body["message"].as_str().is_some_and(|m| m.contains("500")));
    }
}
