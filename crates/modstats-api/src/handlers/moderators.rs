//! Moderator listing and retrieval endpoints

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, HeaderName, HeaderValue},
};
use modstats_core::{ModeratorId, ModeratorRecord};
use std::sync::Arc;
use tracing::{debug, info};

/// Header naming the snapshot a `/api/moderators` response was served from
pub const SNAPSHOT_VERSION_HEADER: HeaderName = HeaderName::from_static("x-snapshot-version");

/// Header carrying the snapshot's read time (RFC 3339)
pub const SNAPSHOT_TAKEN_AT_HEADER: HeaderName = HeaderName::from_static("x-snapshot-taken-at");

/// List every moderator, ordered by id
///
/// The body is the full snapshot as a JSON array. Pass the
/// `X-Snapshot-Version` value to `/api/stats?snapshot=` to get statistics
/// for exactly these records.
///
/// # Errors
///
/// Returns 500 `STORAGE_UNAVAILABLE` if a reload is needed and the store fails.
pub async fn list_moderators(
    State(state): State<Arc<AppState>>,
) -> ApiResult<(HeaderMap, Json<Vec<ModeratorRecord>>)> {
    let snapshot = state.snapshots.current(&state.pool).await?;

    let mut headers = HeaderMap::new();
    headers.insert(SNAPSHOT_VERSION_HEADER, HeaderValue::from(snapshot.version));
    if let Ok(taken_at) = HeaderValue::from_str(&snapshot.taken_at.to_rfc3339()) {
        headers.insert(SNAPSHOT_TAKEN_AT_HEADER, taken_at);
    }

    debug!(
        "Serving {} moderators from snapshot v{}",
        snapshot.records.len(),
        snapshot.version
    );
    Ok((headers, Json(snapshot.records.to_vec())))
}

/// Get one moderator straight from the store
///
/// # Errors
///
/// Returns 400 `MALFORMED_ID` for an id that is not a positive integer,
/// 404 `NOT_FOUND` for an unknown id, and 500 if the store fails.
pub async fn get_moderator(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ModeratorRecord>> {
    let id: ModeratorId = raw_id
        .parse()
        .map_err(|_| ApiError::malformed_id(format!("'{raw_id}' is not a positive integer id")))?;

    let record = modstats_database::get_moderator(&state.pool, id).await.map_err(|e| {
        if matches!(e, modstats_core::Error::NotFound { .. }) {
            info!("Moderator not found: {}", id);
        }
        ApiError::from(e)
    })?;

    Ok(Json(record))
}
