//! Admin API Routes
//!
//! Configures the Axum router with the admin endpoints.

use axum::{routing::get, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{health_handler, slots_handler, stats_handler, AdminState};

/// Creates the admin router.
///
/// # Middleware
/// - CORS: Allows any origin to read the endpoints
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AdminState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/slots", get(slots_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
