//! API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;

use crate::cache::{shared, CacheStore};
use crate::client::{Dispatcher, HttpTransport};
use crate::config::Config;
use crate::error::{FetchError, Result};
use crate::models::{
    ClearKeysRequest, ClearResponse, EntriesResponse, EntryInfo, FetchQuery, HealthResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher<HttpTransport>,
}

impl AppState {
    pub fn new(dispatcher: Dispatcher<HttpTransport>) -> Self {
        Self { dispatcher }
    }

    /// Creates a new AppState from configuration, with a fresh cache store.
    pub fn from_config(config: &Config) -> Result<Self> {
        let cache = shared(CacheStore::new(config.max_keys));
        Ok(Self::new(Dispatcher::from_config(config, cache)?))
    }
}

/// Turns the wildcard capture into an upstream path.
fn upstream_path(path: &str) -> String {
    format!("/{}", path.trim_start_matches('/'))
}

/// Handler for GET /fetch/*path
///
/// Returns the upstream JSON body, served from the cache when fresh.
pub async fn fetch_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<Value>> {
    let value = state
        .dispatcher
        .fetch(&upstream_path(&path), &query.into_params()?)
        .await?;
    Ok(Json(value))
}

/// Handler for GET /refresh/*path
///
/// Always calls the upstream; the cache is neither read nor written.
pub async fn refresh_handler(
    State(state): State<AppState>,
    Path(path): Path<String>,
    Query(query): Query<FetchQuery>,
) -> Result<Json<Value>> {
    let value = state
        .dispatcher
        .refresh(&upstream_path(&path), &query.into_params()?)
        .await?;
    Ok(Json(value))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.dispatcher.stats().await.into())
}

/// Handler for GET /cache/entries
pub async fn entries_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    let cache = state.dispatcher.cache().read().await;
    let entries = cache.entries().map(EntryInfo::from).collect();
    Json(EntriesResponse::new(entries))
}

/// Handler for DELETE /cache
pub async fn clear_handler(State(state): State<AppState>) -> Json<ClearResponse> {
    let removed = state.dispatcher.clear().await;
    Json(ClearResponse::new("all", removed))
}

/// Handler for DELETE /cache/tags/:tag
pub async fn invalidate_tag_handler(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<ClearResponse> {
    let removed = state.dispatcher.invalidate_tag(&tag).await;
    Json(ClearResponse::new(format!("tag {}", tag), removed))
}

/// Handler for DELETE /cache/keys?contains=...
pub async fn clear_keys_handler(
    State(state): State<AppState>,
    Query(req): Query<ClearKeysRequest>,
) -> Result<Json<ClearResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(FetchError::invalid_request(error_msg));
    }

    let removed = state
        .dispatcher
        .clear_where(|entry| entry.key.contains(&req.contains))
        .await;
    Ok(Json(ClearResponse::new(format!("keys containing {}", req.contains), removed)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
