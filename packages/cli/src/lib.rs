// ABOUTME: Server bootstrap shared by the rfpdesk binary's subcommands
// ABOUTME: Tracing setup, database opening, application state, CORS, and the HTTP serve loop

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use sqlx::SqlitePool;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use rfpdesk_api::{create_router, AppState};
use rfpdesk_config::{Config, ConfigError};
use rfpdesk_core::{default_database_path, SystemClock};
use rfpdesk_storage::{connect, connect_file, PoolConfig, StorageError};

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("Invalid CORS origin: {0}")]
    InvalidCorsOrigin(String),
    #[error("Snapshot TTL is out of range")]
    InvalidSnapshotTtl,
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Install the global subscriber. `RUST_LOG` wins; otherwise `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Open the configured database (or the default file) and run migrations
pub async fn open_database(config: &Config) -> Result<SqlitePool, ServerError> {
    let pool_config = PoolConfig {
        max_connections: config.max_connections,
        ..PoolConfig::default()
    };

    let pool = match &config.database_url {
        Some(url) => connect(url, &pool_config).await?,
        None => {
            let path = default_database_path();
            info!("Using database file: {}", path.display());
            connect_file(&path, &pool_config).await?
        }
    };
    Ok(pool)
}

/// Build the application state on the system clock
pub async fn build_state(config: &Config) -> Result<AppState, ServerError> {
    let pool = open_database(config).await?;
    let snapshot_ttl = chrono::Duration::from_std(config.snapshot_ttl)
        .map_err(|_| ServerError::InvalidSnapshotTtl)?;
    Ok(AppState::new(pool, snapshot_ttl, Arc::new(SystemClock)))
}

pub fn cors_layer(config: &Config) -> Result<CorsLayer, ServerError> {
    let origin = config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|_| ServerError::InvalidCorsOrigin(config.cors_origin.clone()))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT])
        .allow_headers(Any))
}

pub async fn run_server(config: Config) -> Result<(), ServerError> {
    let state = build_state(&config).await?;
    let app = create_router(state).layer(cors_layer(&config)?);

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("RFP Desk API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        return;
    }
    info!("Shutting down...");
}
