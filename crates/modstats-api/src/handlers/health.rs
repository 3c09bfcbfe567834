//! Health check endpoints for monitoring

use crate::error::ApiError;
use crate::state::AppState;
use axum::{extract::State, http::StatusCode, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Timestamp of the check
    pub timestamp: DateTime<Utc>,
    /// Record store connectivity
    pub database: DatabaseHealth,
    /// Snapshot cache state
    pub snapshots: SnapshotHealth,
    /// Process uptime in seconds
    pub uptime_seconds: u64,
}

/// Record store health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseHealth {
    /// Whether `SELECT 1` succeeded
    pub connected: bool,
    /// Open connections
    pub pool_size: u32,
    /// Idle connections
    pub idle_connections: u32,
    /// Ping time in milliseconds
    pub response_time_ms: u64,
}

/// Snapshot cache health
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotHealth {
    /// Newest snapshot version, if one has been loaded
    pub latest_version: Option<u64>,
    /// Age of the newest snapshot in milliseconds
    pub latest_age_ms: Option<u64>,
    /// Configured staleness bound in seconds
    pub max_age_secs: u64,
}

/// Readiness check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadinessResponse {
    /// Service readiness status
    pub ready: bool,
    /// Timestamp of the check
    pub timestamp: DateTime<Utc>,
}

/// Basic health check
///
/// Returns 200 with store and snapshot details, or 503 `STORAGE_UNAVAILABLE`
/// when the store does not answer.
///
/// # Example Response
///
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0",
///   "timestamp": "2024-03-15T14:25:30Z",
///   "database": {
///     "connected": true,
///     "pool_size": 1,
///     "idle_connections": 1,
///     "response_time_ms": 0
///   },
///   "snapshots": { "latest_version": 3, "latest_age_ms": 812, "max_age_secs": 5 },
///   "uptime_seconds": 3600
/// }
/// ```
///
/// # Errors
///
/// Returns 503 if the store ping fails.
pub async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, ApiError> {
    let database = check_database_health(&state).await.map_err(|e| {
        error!("Database health check failed: {}", e);
        unavailable()
    })?;

    let latest = state.snapshots.latest();
    let snapshots = SnapshotHealth {
        latest_version: latest.as_ref().map(|s| s.version),
        latest_age_ms: latest
            .as_ref()
            .map(|s| u64::try_from(s.age().as_millis()).unwrap_or(u64::MAX)),
        max_age_secs: state.snapshots.max_age().as_secs(),
    };

    debug!("Health check passed in {}ms", database.response_time_ms);
    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now(),
        database,
        snapshots,
        uptime_seconds: state.uptime_seconds(),
    }))
}

/// Readiness check
///
/// # Errors
///
/// Returns 503 if the store is not reachable.
pub async fn readiness_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReadinessResponse>, ApiError> {
    match sqlx::query("SELECT 1").execute(&state.pool).await {
        Ok(_) => Ok(Json(ReadinessResponse {
            ready: true,
            timestamp: Utc::now(),
        })),
        Err(e) => {
            error!("Readiness check failed - store not accessible: {}", e);
            Err(unavailable())
        }
    }
}

async fn check_database_health(state: &AppState) -> Result<DatabaseHealth, sqlx::Error> {
    let started = Instant::now();

    sqlx::query("SELECT 1 AS health_check")
        .execute(&state.pool)
        .await?;

    Ok(DatabaseHealth {
        connected: true,
        pool_size: state.pool.size(),
        idle_connections: u32::try_from(state.pool.num_idle()).unwrap_or(u32::MAX),
        response_time_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
    })
}

fn unavailable() -> ApiError {
    ApiError::new(
        StatusCode::SERVICE_UNAVAILABLE,
        "STORAGE_UNAVAILABLE",
        "Record store unavailable",
    )
}
