use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use aliaskeep::config::Config;
use aliaskeep::registry::Registry;
use aliaskeep::storage::{load_or_empty, Persister};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("aliaskeep=info,tower_http=info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!("Loaded configuration");

    // Load persisted links
    let store = aliaskeep::open_store(&config);
    info!("Using link store: {}", store.describe());
    let document = load_or_empty(store.as_ref()).await;
    let registry = Arc::new(Registry::from_document(config.registry_settings(), document));
    info!("Loaded {} links", registry.len());

    let persister = Persister::spawn(
        Arc::clone(&registry),
        Arc::clone(&store),
        Duration::from_millis(config.storage.persist_debounce_ms),
    );

    let app = aliaskeep::create_router(Arc::clone(&registry), &config);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("🚀 Server listening on http://{}", addr);
    info!("   - API endpoints available at http://{}/api/links", addr);
    info!("   - Short links resolve under {}/go/...", config.public.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    persister.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
