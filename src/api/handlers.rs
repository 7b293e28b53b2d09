use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use crate::config::PublicConfig;
use crate::models::{CreateLinkRequest, CreateLinkResponse, LinkStatsResponse, LinkView};
use crate::registry::{ExpiryPolicy, NewLink, Registry, RegistryError};

/// Header carrying the caller's identity, set by whatever authenticates them
pub const OWNER_HEADER: &str = "x-owner-id";

pub struct AppState {
    pub registry: Arc<Registry>,
    pub public: PublicConfig,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[derive(Serialize)]
pub struct SuccessResponse {
    pub message: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(err: RegistryError) -> ApiError {
    (
        err.status_code(),
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

fn owner_from(headers: &HeaderMap) -> Option<String> {
    headers
        .get(OWNER_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|owner| !owner.is_empty())
        .map(str::to_string)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Create a new short link
pub async fn create_link(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<CreateLinkRequest>,
) -> Result<(StatusCode, Json<CreateLinkResponse>), ApiError> {
    let expiry = non_empty(payload.expiry)
        .map(|raw| raw.parse::<ExpiryPolicy>())
        .transpose()
        .map_err(error_response)?
        .unwrap_or(ExpiryPolicy::Never);

    let new_link = NewLink {
        target_url: payload.url.trim().to_string(),
        alias: non_empty(payload.alias).map(|a| a.trim().to_string()),
        owner_id: owner_from(&headers),
        expiry,
        password: payload.password,
        utm_enabled: payload.utm,
    };

    let alias = state
        .registry
        .create_link(new_link)
        .map_err(error_response)?;
    let record = state.registry.link(&alias).map_err(error_response)?;

    let short_url = state.public.short_url(&alias);
    Ok((
        StatusCode::CREATED,
        Json(CreateLinkResponse {
            qr_code_url: state.public.qr_code_url(&short_url),
            short_url,
            alias,
            expires_at: record.expires_at,
        }),
    ))
}

/// List links visible to the caller
pub async fn list_links(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<Vec<LinkView>> {
    let owner = owner_from(&headers);
    let now = Utc::now();
    let links = state
        .registry
        .list_links(owner.as_deref())
        .into_iter()
        .map(|record| LinkView::new(record, now, &state.public))
        .collect();
    Json(links)
}

/// Get a single link
pub async fn get_link(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
) -> Result<Json<LinkView>, ApiError> {
    let record = state.registry.link(&alias).map_err(error_response)?;
    Ok(Json(LinkView::new(record, Utc::now(), &state.public)))
}

/// Click count and analytics for a link
pub async fn get_link_stats(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
) -> Result<Json<LinkStatsResponse>, ApiError> {
    let (record, stats) = state.registry.stats(&alias).map_err(error_response)?;
    Ok(Json(LinkStatsResponse {
        alias: record.alias,
        click_count: record.click_count,
        stats,
    }))
}

/// Delete a link and its analytics
pub async fn delete_link(
    State(state): State<Arc<AppState>>,
    Path(alias): Path<String>,
    headers: HeaderMap,
) -> Result<Json<SuccessResponse>, ApiError> {
    let owner = owner_from(&headers);
    state
        .registry
        .delete_link(&alias, owner.as_deref())
        .map_err(error_response)?;
    Ok(Json(SuccessResponse {
        message: "Link deleted".to_string(),
    }))
}

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
