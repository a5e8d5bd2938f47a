//! investment-portal server entry point.
//!
//! Loads configuration, wires the store, service and event log, and serves
//! the REST API until Ctrl-C.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use investment_portal::app_state::AppState;
use investment_portal::auth::JwtKeys;
use investment_portal::build_app;
use investment_portal::config::{AppConfig, LogFormat};
use investment_portal::domain::UploadPolicy;
use investment_portal::service::{EventSink, InvestmentService, spawn_event_log};
use investment_portal::store::{BlobStore, FsBlobStore, InvestmentRepository, MemoryStore, PgStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = AppConfig::from_env().map_err(anyhow::Error::msg)?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    tracing::info!(addr = %config.listen_addr, "starting investment-portal");

    // Build storage layer
    let repo: Arc<dyn InvestmentRepository> = if config.persistence_enabled {
        Arc::new(
            PgStore::connect(&config)
                .await
                .context("failed to connect to PostgreSQL")?,
        )
    } else {
        tracing::warn!("persistence disabled, using the in-memory store");
        Arc::new(MemoryStore::new())
    };
    let blobs: Arc<dyn BlobStore> = Arc::new(FsBlobStore::new(&config.file_storage_root));

    // Build domain and service layer
    let events = if config.event_log_enabled {
        let (sink, _handle) = spawn_event_log(config.event_log_capacity, Arc::clone(&repo));
        sink
    } else {
        EventSink::disabled()
    };
    let investment_service = Arc::new(InvestmentService::new(
        repo,
        blobs,
        events,
        UploadPolicy::with_max_bytes(config.max_upload_bytes),
    ));

    // Build application state
    let app_state = AppState {
        investment_service,
        auth: Arc::new(JwtKeys::from_secret(config.jwt_secret.as_bytes())),
    };

    let app = build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
