//! Anonymat - Application Entry Point
//!
//! This is the main entry point for the Anonymat server.

use std::{net::SocketAddr, sync::Arc};

use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anonymat::{
    config::{Config, LogFormat, StoreBackend},
    db::{self, AuditSink, MemoryStore, PgStore, Store},
    state::AppState,
    storage::LocalFileStore,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    // Initialize tracing
    let (json, pretty) = match config.server.log_format {
        LogFormat::Json => (Some(tracing_subscriber::fmt::layer().json()), None),
        LogFormat::Pretty => (None, Some(tracing_subscriber::fmt::layer())),
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.server.rust_log.clone().into()),
        )
        .with(json)
        .with(pretty)
        .init();

    tracing::info!("Starting Anonymat server...");

    let (store, audit_sink): (Arc<dyn Store>, Arc<dyn AuditSink>) = match config.database.backend
    {
        StoreBackend::Postgres => {
            let url = config
                .database
                .url
                .as_deref()
                .ok_or_else(|| {
                    anyhow::anyhow!("DATABASE_URL is required for the postgres backend")
                })?;

            tracing::info!("Connecting to database...");
            let pool = db::create_pool(url, config.database.max_connections).await?;
            db::test_connection(&pool).await?;

            tracing::info!("Running database migrations...");
            db::run_migrations(&pool).await?;

            let store = Arc::new(PgStore::new(pool));
            (store.clone() as Arc<dyn Store>, store as Arc<dyn AuditSink>)
        }
        StoreBackend::Memory => {
            tracing::warn!("Using the in-memory store, nothing survives a restart");
            let store = Arc::new(MemoryStore::new());
            (store.clone() as Arc<dyn Store>, store as Arc<dyn AuditSink>)
        }
    };

    let cipher = config.cipher.build_cipher()?;
    tracing::info!(active_key = %cipher.active_key_id(), "Path cipher ready");

    let files = Arc::new(LocalFileStore::new(config.storage.root.clone()));
    tracing::info!(root = %config.storage.root.display(), "File store ready");

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    // Create application state
    let state = AppState::new(config, store, audit_sink, cipher, files);
    let app = anonymat::app(state);

    // Start the server
    let listener = TcpListener::bind(addr).await?;

    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
