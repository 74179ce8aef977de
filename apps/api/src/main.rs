mod config;
mod db;
mod errors;
mod learning;
mod llm_client;
mod models;
mod opportunities;
mod profile;
mod routes;
mod scan;
mod scoring;
mod skills;
mod sources;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use tokio::sync::watch;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::llm_client::{LlmClient, Reasoner};
use crate::routes::build_router;
use crate::scoring::{FitScorer, HeuristicFitScorer, ReasoningFitScorer};
use crate::skills::extraction::SkillExtractor;
use crate::skills::taxonomy::update_trends;
use crate::sources::build_http_client;
use crate::sources::registry::SourceRegistry;
use crate::state::AppState;
use crate::store::PgStore;

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

    info!("Starting Hunter API v{}", env!("CARGO_PKG_VERSION"));

    let pool = create_pool(&config.database_url).await?;
    let store = Arc::new(PgStore::new(pool));

    // Reasoning service is optional: without a key everything runs on heuristics
    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.llm_timeout)?;
    let reasoner: Option<Arc<dyn Reasoner>> = if llm.is_configured() {
        info!("LLM client initialized (model: {})", llm_client::MODEL);
        Some(Arc::new(llm))
    } else {
        warn!("ANTHROPIC_API_KEY not set, using heuristic scoring and dictionary skill extraction");
        None
    };
    let fit_scorer: Arc<dyn FitScorer> = match &reasoner {
        Some(reasoner) => Arc::new(ReasoningFitScorer::new(reasoner.clone())),
        None => Arc::new(HeuristicFitScorer),
    };
    let skill_extractor = SkillExtractor::new(reasoner);

    let http = build_http_client(config.source_timeout)?;
    let sources = Arc::new(SourceRegistry::new(http, config.source_timeout));
    info!("Built-in sources: {}", sources.builtin_names().join(", "));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    if config.skill_trend_interval.is_zero() {
        info!("Periodic skill trend refresh disabled");
    } else {
        tokio::spawn(refresh_trends_periodically(
            store.clone(),
            config.skill_trend_interval,
            shutdown_rx.clone(),
        ));
    }

    let state = AppState {
        store,
        config: config.clone(),
        fit_scorer,
        skill_extractor,
        sources,
        shutdown: shutdown_rx,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await?;

    info!("Server stopped");
    Ok(())
}

/// Waits for Ctrl-C, then tells running scans and background tasks to stop.
async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutdown signal received");
    let _ = shutdown_tx.send(true);
}

async fn refresh_trends_periodically(
    store: Arc<PgStore>,
    every: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(every);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                match update_trends(store.as_ref(), Utc::now()).await {
                    Ok(changed) => info!("Skill trend refresh updated {changed} skills"),
                    Err(e) => error!("Skill trend refresh failed: {e}"),
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}
