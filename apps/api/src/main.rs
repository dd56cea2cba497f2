mod analysis;
mod chat;
mod config;
mod db;
mod errors;
mod llm_client;
mod models;
mod routes;
mod scoring;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::cache::ResponseCache;
use crate::analysis::resilient::ResilientOrchestrator;
use crate::analysis::service::HealthAnalyzer;
use crate::analysis::throttle::RequestThrottle;
use crate::chat::orchestrator::ChatOrchestrator;
use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, LlmConfig};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::postgres::PgHealthStore;
use crate::store::HealthDataStore;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails fast on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Health API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url, config.db_max_connections).await?;
    let store: Arc<dyn HealthDataStore> = Arc::new(PgHealthStore::new(db));

    // Initialize LLM client
    if config.ai_api_key.is_none() {
        warn!("AI_API_KEY is not set, every AI call will use the deterministic fallback");
    }
    let llm = LlmClient::new(LlmConfig {
        base_url: config.ai_base_url.clone(),
        api_key: config.ai_api_key.clone(),
        model: config.ai_model.clone(),
        vision_model: config.ai_vision_model.clone(),
        timeout: config.ai_timeout,
        max_attempts: config.ai_max_attempts,
    })?;
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm.model(),
        config.ai_timeout
    );
    let orchestrator = ResilientOrchestrator::new(Arc::new(llm));

    // Throttle and cache live for the life of the process
    let throttle = RequestThrottle::new(config.throttle_limit, config.throttle_window);
    let cache = ResponseCache::new(config.cache_ttl);
    info!(
        "Throttle: {} requests per {:?}; analysis cache TTL: {:?}",
        config.throttle_limit, config.throttle_window, config.cache_ttl
    );

    // Build app state
    let state = AppState {
        analyzer: Arc::new(HealthAnalyzer::new(
            store.clone(),
            orchestrator.clone(),
            throttle,
            cache,
        )),
        chat: Arc::new(ChatOrchestrator::new(
            store,
            orchestrator,
            config.chat_history_limit,
        )),
    };

    // Build router
    let app = build_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
