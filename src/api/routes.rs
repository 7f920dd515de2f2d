//! v1 API route table.

use axum::routing::{get, post};
use axum::Router;

use super::handlers::{self, ApiState};

/// Build the v1 API router.
pub fn api_routes(state: ApiState) -> Router {
    Router::new()
        // Analytics (CSV upload)
        .route("/analyze", post(handlers::analyze))
        .route("/health", post(handlers::health))
        .route("/dsi", post(handlers::dsi))
        .route("/reliability", post(handlers::reliability))
        .route("/clusters", post(handlers::clusters))
        .route("/insights", post(handlers::insights))
        // Service
        .route("/status", get(handlers::status))
        .with_state(state)
}
