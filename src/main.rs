use anyhow::Context;
use std::net::SocketAddr;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cinemax_api::{app, config::Config, services::cleanup::CleanupService, AppState};

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("invalid configuration")?;

    // JSON lines in production, human-readable output everywhere else
    let json_logs = config.app.environment == "production";
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.app.rust_log)))
        .with(json_logs.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json_logs).then(tracing_subscriber::fmt::layer))
        .init();

    info!("Starting CineMax API ({})", config.app.environment);

    let state = AppState::new(config.clone())
        .await
        .context("failed to initialise application state")?;
    info!("Database ready, {} movies in catalog", state.catalog.all().await.len());

    // --- Background tasks ---
    let cleanup = CleanupService::new(state.clone());
    tokio::spawn(cleanup.run(config.maintenance.session_cleanup_interval));

    // --- Web server ---
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.bind_address()))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
