//! API route definitions

use crate::{handlers, state::AppState};
use axum::{Json, Router, http::StatusCode, routing::get};
use modstats_core::ErrorResponse;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;

/// Moderator, statistics and export routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/moderators", get(handlers::moderators::list_moderators))
        .route(
            "/api/moderators/:id",
            get(handlers::moderators::get_moderator),
        )
        .route("/api/stats", get(handlers::stats::get_stats))
        .route(
            "/api/export/moderators.csv",
            get(handlers::export::export_moderators_csv),
        )
        .route(
            "/api/stats/export",
            get(handlers::export::export_moderators_csv),
        )
        .route(
            "/api/stats/export/:id",
            get(handlers::export::export_moderator_csv),
        )
        .route(
            "/api/analytics/comparison",
            get(handlers::analytics::compare_moderators),
        )
        .route("/api", get(api_info))
        .layer(CompressionLayer::new())
}

/// Health check routes
pub fn health_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
}

/// Combine all routes into a single router
pub fn build_router() -> Router<Arc<AppState>> {
    Router::new()
        .merge(api_routes())
        .merge(health_routes())
        .fallback(not_found_handler)
}

async fn not_found_handler() -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse::new(
            "The requested endpoint does not exist",
            "ROUTE_NOT_FOUND",
        )),
    )
}

async fn api_info() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "api": "Moderator Statistics API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "moderators": "/api/moderators",
            "moderator": "/api/moderators/:id",
            "stats": "/api/stats",
            "export": "/api/export/moderators.csv",
            "moderator_export": "/api/stats/export/:id",
            "comparison": "/api/analytics/comparison?ids=",
            "health": "/health"
        }
    }))
}
