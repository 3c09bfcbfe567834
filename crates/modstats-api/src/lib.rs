//! Moderator statistics API server library

#![forbid(unsafe_code)]

pub mod error;
pub mod handlers;
pub mod routes;
pub mod snapshot;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    Router,
    http::{HeaderValue, Method},
};
use handlers::moderators::{SNAPSHOT_TAKEN_AT_HEADER, SNAPSHOT_VERSION_HEADER};
use modstats_core::config::ApiConfig;
use modstats_core::context_error::Result;
use modstats_core::{Config, context_error};
use modstats_database::SqlitePool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tracing::info;

/// Build the API router with all routes and middleware
///
/// # Errors
///
/// Returns an error if the configuration is invalid or a CORS origin cannot
/// be parsed.
pub fn build_router(config: Config, pool: SqlitePool) -> Result<Router> {
    let cors = if config.api.enable_cors {
        Some(cors_layer(&config.api)?)
    } else {
        None
    };
    let timeout = Duration::from_secs(config.api.request_timeout_secs);

    let state = Arc::new(AppState::new(config, pool)?);

    let mut app = routes::build_router()
        .with_state(state)
        .layer(TimeoutLayer::new(timeout));

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    Ok(app)
}

fn cors_layer(api: &ApiConfig) -> Result<CorsLayer> {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET])
        .allow_headers(Any)
        .expose_headers([SNAPSHOT_VERSION_HEADER, SNAPSHOT_TAKEN_AT_HEADER]);

    if api.cors_origins.iter().any(|origin| origin == "*") {
        info!("CORS enabled for any origin");
        return Ok(layer.allow_origin(Any));
    }

    let origins = api
        .cors_origins
        .iter()
        .map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| context_error!("Invalid CORS origin '{}': {}", origin, e))
        })
        .collect::<Result<Vec<_>>>()?;

    info!("CORS enabled for {} origin(s)", origins.len());
    Ok(layer.allow_origin(AllowOrigin::list(origins)))
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    fn lazy_pool() -> SqlitePool {
        SqlitePoolOptions::new()
            .max_connections(1)
            .connect_lazy("sqlite::memory:")
            .expect("Failed to create test pool")
    }

    #[tokio::test]
    async fn test_build_router_with_default_config() {
        assert!(build_router(Config::default(), lazy_pool()).is_ok());
    }

    #[tokio::test]
    async fn test_build_router_with_origin_list() {
        let mut config = Config::default();
        config.api.cors_origins = vec!["http://localhost:5173".to_string()];
        assert!(build_router(config, lazy_pool()).is_ok());
    }

    #[tokio::test]
    async fn test_build_router_rejects_bad_origin() {
        let mut config = Config::default();
        config.api.cors_origins = vec!["bad\norigin".to_string()];
        assert!(build_router(config, lazy_pool()).is_err());
    }

    #[tokio::test]
    async fn test_build_router_without_cors() {
        let mut config = Config::default();
        config.api.enable_cors = false;
        config.api.cors_origins = vec!["bad\norigin".to_string()];
        assert!(build_router(config, lazy_pool()).is_ok());
    }
}
