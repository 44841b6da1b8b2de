//! Response models for the admin API
//!
//! This module defines the DTOs serialized by the read-only admin endpoints.

pub mod responses;

// Re-export commonly used types
pub use responses::{HealthResponse, SlotsResponse, StatsResponse};
