//! promptpool-gateway server entry point.
//!
//! Starts the Axum HTTP server with REST and WebSocket endpoints and the
//! contract polling tasks.

use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use promptpool_gateway::api;
use promptpool_gateway::app_state::AppState;
use promptpool_gateway::config::GatewayConfig;
use promptpool_gateway::persistence::{
    InMemoryReferralStore, PostgresReferralStore, ReferralStore,
};
use promptpool_gateway::ws::handler::ws_handler;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = GatewayConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    tracing::info!(addr = %config.listen_addr, ?config, "starting promptpool-gateway");

    // Referral bookkeeping
    let store: Arc<dyn ReferralStore> = if config.persistence_enabled {
        let store = PostgresReferralStore::connect(&config)
            .await
            .context("connecting to PostgreSQL")?;
        store.migrate().await.context("running migrations")?;
        tracing::info!("referral store: postgres");
        Arc::new(store)
    } else {
        tracing::warn!("PERSISTENCE_ENABLED=false; referrals are kept in memory");
        Arc::new(InMemoryReferralStore::new())
    };

    // Build application state
    let listen_addr = config.listen_addr;
    let app_state = AppState::build(config, store)
        .await
        .context("building application state")?;
    let _pollers = app_state.monitor.spawn();

    // Build router
    let app = Router::new()
        .merge(api::build_router())
        .route("/ws", get(ws_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    tracing::info!(addr = %listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
