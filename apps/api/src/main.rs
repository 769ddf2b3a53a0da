mod config;
mod db;
mod errors;
mod forecast;
mod llm_client;
mod models;
mod routes;
mod state;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::forecast::data_source::PgObservationSource;
use crate::forecast::pipeline::ForecastPipeline;
use crate::llm_client::GeminiClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Forecaster API v{}", env!("CARGO_PKG_VERSION"));

    // Historical observations (read-only)
    let db = create_pool(&config.database_url).await?;
    let history = Arc::new(PgObservationSource::new(db));

    // Generative model client; the pipeline applies its own timeout around each call
    let llm = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.web_search,
        config.upstream_timeout,
    )?;
    info!(
        "LLM client initialized (model: {}, web search: {})",
        llm.model(),
        config.web_search
    );

    let pipeline = ForecastPipeline::new(history, Arc::new(llm), config.upstream_timeout);
    let state = AppState { pipeline };

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
