//! LightChat Server
//!
//! Hands out a shared API key and relays streamed chat completions as plain text.

pub mod config;
pub mod key_pool;
pub mod routes;

use anyhow::{Context, Result};
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

pub use config::ServerConfig;
pub use key_pool::KeyPool;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub keys: Arc<KeyPool>,
    pub http: reqwest::Client,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build upstream HTTP client")?;
        let keys = KeyPool::new(config.api_keys.clone());
        Ok(Self {
            config: Arc::new(config),
            keys: Arc::new(keys),
            http,
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/healthz", get(routes::health_check))
        .route("/api/get_available_api_key", get(routes::get_available_api_key))
        .route("/api/chat", post(routes::chat))
        .layer(cors)
        .with_state(state)
}

/// Bind and serve until `shutdown` resolves.
pub async fn run<F>(config: ServerConfig, shutdown: F) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let bind = config.bind.clone();
    let state = AppState::new(config)?;
    tracing::info!(
        "LightChat server starting: bind={}, upstream={}, model={}, shared_keys={}",
        bind,
        state.config.upstream_url,
        state.config.model,
        state.keys.len()
    );

    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Server error")?;

    tracing::info!("LightChat server stopped");
    Ok(())
}
