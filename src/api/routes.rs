use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

use crate::config::PublicConfig;
use crate::registry::Registry;

use super::handlers::{
    create_link, delete_link, get_link, get_link_stats, health_check, list_links, AppState,
};

pub fn create_api_router(registry: Arc<Registry>, public: PublicConfig) -> Router {
    let state = Arc::new(AppState { registry, public });

    Router::new()
        .route("/health", get(health_check))
        .route("/api/links", post(create_link).get(list_links))
        .route("/api/links/{alias}", get(get_link).delete(delete_link))
        .route("/api/links/{alias}/stats", get(get_link_stats))
        // Paths used by the earlier flat-file shortener
        .route("/shorten", post(create_link))
        .route("/delete/{alias}", delete(delete_link))
        .with_state(state)
}
