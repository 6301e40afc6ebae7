use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod handlers;
mod id;
mod models;
mod store;

use id::IdGenerator;
use store::{FileStore, LinkStore, MemoryStore};

// ── Shared application state ───────────────────────────────────────────────

pub struct AppState {
    /// Backend behind the shrink/unwrap handlers: the file store, or the
    /// memory store when no storage file is configured.
    pub store: Arc<dyn LinkStore>,
}

// ── Entry point ────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env (absent is fine, env vars may already be set)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "shrinkr=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Flags first, then environment, then defaults
    let config = config::AppConfig::load()?;
    tracing::info!("Starting shrinkr on {}", config.server_address);
    tracing::info!("Base URL: {}", config.base_url);
    tracing::info!("Id strategy: {:?}", config.id_strategy);

    let ids = IdGenerator::new(config.id_strategy);
    let store: Arc<dyn LinkStore> = match &config.file_storage_path {
        Some(path) => {
            let store = FileStore::new(path, ids).with_base_url(&config.base_url);

            // Fail fast on an unreadable table instead of on the first request
            let entries = store.len().await.with_context(|| {
                format!("failed to load storage file {}", store.path().display())
            })?;
            tracing::info!(
                "Storage file {} holds {} link(s)",
                store.path().display(),
                entries
            );
            Arc::new(store)
        }
        None => {
            tracing::warn!("No storage file configured, links are kept in memory only");
            Arc::new(MemoryStore::new(ids).with_base_url(&config.base_url))
        }
    };

    let state = Arc::new(AppState { store });
    let app = handlers::router(state);

    // ── Serve ──────────────────────────────────────────────────────────────
    let listener = tokio::net::TcpListener::bind(&config.server_address)
        .await
        .with_context(|| format!("failed to bind {}", config.server_address))?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
