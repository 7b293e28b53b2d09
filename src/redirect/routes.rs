use axum::{routing::get, Router};
use std::sync::Arc;

use crate::config::RedirectMode;
use crate::registry::Registry;

use super::handlers::{redirect_link, RedirectState};

pub fn create_redirect_router(
    registry: Arc<Registry>,
    redirect_mode: RedirectMode,
    country_header: String,
) -> Router {
    let state = Arc::new(RedirectState {
        registry,
        redirect_mode,
        country_header,
    });

    Router::new()
        .route("/go/{alias}", get(redirect_link))
        .with_state(state)
}
