use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use std::sync::Arc;

use crate::analytics::Visit;
use crate::config::RedirectMode;
use crate::registry::{Registry, RegistryError};

/// Alternative to `?password=` for clients that prefer not to put secrets in URLs
pub const PASSWORD_HEADER: &str = "x-link-password";

pub struct RedirectState {
    pub registry: Arc<Registry>,
    pub redirect_mode: RedirectMode,
    /// Lowercased name of the header carrying the visitor's country code
    pub country_header: String,
}

#[derive(Debug, Deserialize)]
pub struct RedirectQuery {
    pub password: Option<String>,
}

fn header_string(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
}

/// Redirect to the link's target
pub async fn redirect_link(
    State(state): State<Arc<RedirectState>>,
    Path(alias): Path<String>,
    Query(query): Query<RedirectQuery>,
    headers: HeaderMap,
) -> Response {
    let password = query
        .password
        .or_else(|| header_string(&headers, PASSWORD_HEADER));
    let visit = Visit {
        referrer: header_string(&headers, header::REFERER.as_str()),
        user_agent: header_string(&headers, header::USER_AGENT.as_str()),
        country: header_string(&headers, &state.country_header),
    };

    match state.registry.resolve(&alias, password.as_deref(), &visit) {
        Ok(target) => match HeaderValue::from_str(&target) {
            Ok(value) => {
                (state.redirect_mode.status_code(), [(header::LOCATION, value)]).into_response()
            }
            Err(_) => {
                tracing::error!(alias = %alias, target_url = %target, "target URL is not a valid Location header");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        },
        Err(RegistryError::NotFound) => (StatusCode::NOT_FOUND, "Link not found").into_response(),
        Err(RegistryError::Expired) => (StatusCode::GONE, "This link has expired").into_response(),
        Err(RegistryError::PasswordRequired) => {
            (StatusCode::UNAUTHORIZED, "Password required").into_response()
        }
        Err(e) => (e.status_code(), e.to_string()).into_response(),
    }
}
