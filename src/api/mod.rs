//! Admin API Module
//!
//! Read-only HTTP endpoints for inspecting the proxy cache.
//!
//! # Endpoints
//! - `GET /health` - Health check endpoint
//! - `GET /stats` - Cache counters and occupancy
//! - `GET /slots` - Per-slot metadata

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
