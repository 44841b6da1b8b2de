//! Response DTOs for the admin API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::{SlotSnapshot, StatsSnapshot};

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Requests served from the cache
    pub hits: u64,
    /// Requests forwarded to an origin
    pub misses: u64,
    /// Objects stored
    pub insertions: u64,
    /// Entries overwritten by a different key
    pub evictions: u64,
    /// Responses too large to cache
    pub oversized: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// Slots currently holding an object
    pub occupied_slots: usize,
    /// Total number of slots
    pub capacity: usize,
}

impl StatsResponse {
    /// Creates a new StatsResponse from a counters snapshot
    pub fn new(stats: StatsSnapshot, occupied_slots: usize, capacity: usize) -> Self {
        Self {
            hit_rate: stats.hit_rate(),
            hits: stats.hits,
            misses: stats.misses,
            insertions: stats.insertions,
            evictions: stats.evictions,
            oversized: stats.oversized,
            occupied_slots,
            capacity,
        }
    }
}

/// Response body for the slots endpoint (GET /slots)
#[derive(Debug, Clone, Serialize)]
pub struct SlotsResponse {
    pub capacity: usize,
    pub slots: Vec<SlotSnapshot>,
}

impl SlotsResponse {
    pub fn new(slots: Vec<SlotSnapshot>) -> Self {
        Self {
            capacity: slots.len(),
            slots,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
