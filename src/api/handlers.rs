//! Admin API Handlers
//!
//! HTTP request handlers for each admin endpoint.

use std::sync::Arc;

use axum::{extract::State, Json};

use crate::cache::CacheStore;
use crate::error::Result;
use crate::models::{HealthResponse, SlotsResponse, StatsResponse};

/// Application state shared across all admin handlers.
///
/// Shares the same store the proxy's connection tasks use.
#[derive(Clone)]
pub struct AdminState {
    pub cache: Arc<CacheStore>,
}

impl AdminState {
    /// Creates a new AdminState over the given store.
    pub fn new(cache: Arc<CacheStore>) -> Self {
        Self { cache }
    }
}

/// Handler for GET /stats
///
/// Returns cache counters together with slot occupancy.
pub async fn stats_handler(State(state): State<AdminState>) -> Result<Json<StatsResponse>> {
    let occupied = state.cache.occupied_len().await?;

    Ok(Json(StatsResponse::new(
        state.cache.stats().snapshot(),
        occupied,
        state.cache.capacity(),
    )))
}

/// Handler for GET /slots
///
/// Returns the key, priority and size held by every slot.
pub async fn slots_handler(State(state): State<AdminState>) -> Result<Json<SlotsResponse>> {
    let slots = state.cache.snapshot().await?;
    Ok(Json(SlotsResponse::new(slots)))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
