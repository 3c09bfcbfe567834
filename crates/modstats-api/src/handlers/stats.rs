//! Aggregated statistics endpoint

use crate::error::{ApiError, ApiResult};
use crate::snapshot::SnapshotLookup;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use modstats_core::{DashboardStats, RankingMetric, compute_stats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};
use validator::Validate;

/// Query parameters for statistics
#[derive(Debug, Default, Deserialize, Validate)]
pub struct StatsQuery {
    /// Ranking metric: `total` or an action type
    pub metric: Option<String>,

    /// Maximum leaderboard length
    #[validate(range(min = 1, max = 1000))]
    pub limit: Option<usize>,

    /// Snapshot version from a prior `/api/moderators` response
    pub snapshot: Option<u64>,
}

/// Statistics response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Snapshot the statistics were computed from
    pub snapshot_version: u64,

    /// When that snapshot's records were read
    pub snapshot_taken_at: DateTime<Utc>,

    /// When these statistics were computed
    pub generated_at: DateTime<Utc>,

    /// The aggregates themselves
    #[serde(flatten)]
    pub stats: DashboardStats,
}

/// Compute dashboard statistics
///
/// Unpinned requests use a snapshot no older than `api.snapshot_max_age_secs`.
/// With `snapshot=N` the statistics are computed from exactly snapshot `N`,
/// provided it is still retained and within that same age.
///
/// # Errors
///
/// Returns 400 for malformed parameters or a never-issued snapshot, 410 for
/// an evicted or over-age snapshot and 500 if the store fails.
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    query: Result<Query<StatsQuery>, QueryRejection>,
) -> ApiResult<Json<StatsResponse>> {
    let Query(params) = query?;
    params.validate()?;

    let metric = match params.metric.as_deref() {
        Some(raw) => raw.parse::<RankingMetric>()?,
        None => state.default_metric.clone(),
    };

    let snapshot = match params.snapshot {
        Some(version) => match state.snapshots.get(version) {
            SnapshotLookup::Found(snapshot) => snapshot,
            SnapshotLookup::Expired => {
                warn!("Stats requested for expired snapshot v{}", version);
                return Err(ApiError::snapshot_expired(version));
            }
            SnapshotLookup::Unknown => {
                return Err(ApiError::malformed_input(format!(
                    "snapshot {version} was never issued"
                )));
            }
        },
        None => state.snapshots.current(&state.pool).await?,
    };

    let mut stats = compute_stats(&snapshot.records, &metric);
    if let Some(limit) = params.limit {
        stats.truncate_leaderboard(limit);
    }

    debug!(
        "Computed stats for snapshot v{} by {} ({} entries)",
        snapshot.version,
        metric,
        stats.leaderboard.len()
    );

    Ok(Json(StatsResponse {
        snapshot_version: snapshot.version,
        snapshot_taken_at: snapshot.taken_at,
        generated_at: Utc::now(),
        stats,
    }))
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_validation() {
        let ok = StatsQuery {
            limit: Some(10),
            ..StatsQuery::default()
        };
        assert!(ok.validate().is_ok());

        let zero = StatsQuery {
            limit: Some(0),
            ..StatsQuery::default()
        };
        assert!(zero.validate().is_err());

        let huge = StatsQuery {
            limit: Some(5000),
            ..StatsQuery::default()
        };
        assert!(huge.validate().is_err());
    }

    #[test]
    fn test_stats_response_flattens_aggregates() {
        let response = StatsResponse {
            snapshot_version: 3,
            snapshot_taken_at: Utc::now(),
            generated_at: Utc::now(),
            stats: compute_stats(&[], &RankingMetric::Total),
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["snapshot_version"], 3);
        assert_eq!(json["metric"], "total");
        assert!(json["leaderboard"].as_array().unwrap().is_empty());
        assert!(json["totals"].as_object().unwrap().is_empty());
    }
}
