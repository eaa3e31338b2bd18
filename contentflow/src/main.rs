//! Contentflow server
//!
//! Wires the OpenAI and SerpAPI providers into the three stage agents, starts
//! the worker pool and the cleanup scheduler, and serves the HTTP API until
//! interrupted.

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};

use contentflow::api::{self, AppState};
use contentflow::config::{AppConfig, CliArgs};
use contentflow::dispatch::{CleanupScheduler, GenerationService};
use contentflow::events::LoggingEventSink;
use contentflow::observability::{init_tracing, DEFAULT_LOG_FILTER};
use contentflow::persistence::InMemoryContentStore;
use contentflow::pipeline::Orchestrator;
use contentflow::providers::{
    CachedSearch, DisabledSearch, ImageDownloader, ImageTool, OpenAiClient, SerpApiSearch,
    WebSearch,
};
use contentflow::stages::{ContentAgent, ImageAgent, ResearchAgent};

fn build_search(config: &AppConfig) -> anyhow::Result<Arc<dyn WebSearch>> {
    if !config.search.is_active() {
        info!("Web search disabled; research uses the language model only");
        return Ok(Arc::new(DisabledSearch));
    }
    let serpapi = SerpApiSearch::new(config.search.clone()).context("building search client")?;
    Ok(Arc::new(CachedSearch::new(
        serpapi,
        config.search.cache_ttl(),
        config.search.cache_max_entries,
    )))
}

async fn build_orchestrator(config: &AppConfig) -> anyhow::Result<Orchestrator> {
    let openai = Arc::new(OpenAiClient::new(&config.openai).context("building OpenAI client")?);

    let downloader = ImageDownloader::new(&config.images).context("building image downloader")?;
    if let Err(e) = downloader.prepare().await {
        warn!(
            path = %config.images.storage_path.display(),
            error = %e,
            "Could not create image storage directory"
        );
    }
    let image_tool = ImageTool::new(openai.clone(), &config.images).context("building image tool")?;

    Ok(Orchestrator::new(
        Arc::new(ResearchAgent::new(openai.clone(), build_search(config)?)),
        Arc::new(ContentAgent::new(openai.clone())),
        Arc::new(ImageAgent::new(openai, image_tool)),
    )
    .with_event_sink(Arc::new(LoggingEventSink::default())))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("Shutdown requested");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let config = CliArgs::parse().into_config()?;
    init_tracing(config.log_format, DEFAULT_LOG_FILTER)?;

    let store = Arc::new(InMemoryContentStore::new());
    for email in &config.server.users {
        store.register_user(email);
    }

    let service = Arc::new(GenerationService::new(
        build_orchestrator(&config).await?,
        store,
        config.dispatch.clone(),
        &config.cleanup,
    ));
    let cleanup = CleanupScheduler::new(service.clone(), config.cleanup.interval()).start();

    let mut state = AppState::new(service.clone());
    if config.images.download_enabled {
        state = state.with_image_dir(&config.images.storage_path);
    }
    let app = api::router(state);

    let listener = TcpListener::bind(config.server.bind_address)
        .await
        .with_context(|| format!("binding {}", config.server.bind_address))?;
    info!(address = %config.server.bind_address, "Contentflow listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cleanup.stop().await;
    if !service.shutdown().await {
        warn!("Worker pool did not drain before the shutdown grace period");
    }
    info!("Contentflow stopped");
    Ok(())
}
