pub mod analytics;
pub mod api;
pub mod config;
pub mod models;
pub mod redirect;
pub mod registry;
pub mod storage;

use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use config::Config;
use registry::Registry;
use storage::{JsonFileStore, MemoryStore, Store};

/// Full HTTP surface: management API plus the redirect route
pub fn create_router(registry: Arc<Registry>, config: &Config) -> Router {
    let api_router = api::create_api_router(Arc::clone(&registry), config.public.clone());
    let redirect_router = redirect::create_redirect_router(
        registry,
        config.redirect_status,
        config.analytics.country_header.clone(),
    );

    api_router
        .merge(redirect_router)
        .layer(TraceLayer::new_for_http())
}

/// Store selected by `DATA_FILE`
pub fn open_store(config: &Config) -> Arc<dyn Store> {
    match &config.storage.data_file {
        Some(path) => Arc::new(JsonFileStore::new(path)),
        None => Arc::new(MemoryStore::new()),
    }
}
