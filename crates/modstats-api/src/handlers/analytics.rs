//! Side-by-side comparison of selected moderators

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State, rejection::QueryRejection},
};
use chrono::{DateTime, Utc};
use modstats_core::{DashboardStats, ModeratorId, ModeratorRecord, RankingMetric, compute_stats};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Most ids one comparison may name
pub const MAX_COMPARISON_IDS: usize = 50;

/// Query parameters for a comparison
#[derive(Debug, Default, Deserialize)]
pub struct ComparisonQuery {
    /// Comma-separated moderator ids, e.g. `1,4,7`
    pub ids: Option<String>,

    /// Ranking metric for the leaderboard: `total` or an action type
    pub metric: Option<String>,
}

/// Comparison response
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonResponse {
    /// Snapshot the records were taken from
    pub snapshot_version: u64,

    /// When that snapshot's records were read
    pub snapshot_taken_at: DateTime<Utc>,

    /// The selected records, in the order they were asked for
    pub moderators: Vec<ModeratorRecord>,

    /// Aggregates over the selected records only
    pub stats: DashboardStats,
}

/// Compare the named moderators
///
/// Records come from one snapshot, so every entry and the aggregates agree.
/// A repeated id is compared once.
///
/// # Errors
///
/// Returns 400 `MALFORMED_INPUT` when `ids` is missing, empty or too long,
/// 400 `MALFORMED_ID` for an id that is not a positive integer, 404
/// `NOT_FOUND` for an id not in the snapshot and 500 if the store fails.
pub async fn compare_moderators(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ComparisonQuery>, QueryRejection>,
) -> ApiResult<Json<ComparisonResponse>> {
    let Query(params) = query?;
    let ids = parse_ids(params.ids.as_deref().unwrap_or_default())?;

    let metric = match params.metric.as_deref() {
        Some(raw) => raw.parse::<RankingMetric>()?,
        None => state.default_metric.clone(),
    };

    let snapshot = state.snapshots.current(&state.pool).await?;

    let moderators = ids
        .iter()
        .map(|&id| {
            snapshot
                .records
                .binary_search_by_key(&id, |record| record.id)
                .ok()
                .and_then(|idx| snapshot.records.get(idx))
                .cloned()
                .ok_or_else(|| {
                    ApiError::from(modstats_core::Error::NotFound {
                        resource: format!("Moderator {id}"),
                    })
                })
        })
        .collect::<ApiResult<Vec<_>>>()?;

    let stats = compute_stats(&moderators, &metric);

    debug!(
        "Compared {} moderators from snapshot v{}",
        moderators.len(),
        snapshot.version
    );

    Ok(Json(ComparisonResponse {
        snapshot_version: snapshot.version,
        snapshot_taken_at: snapshot.taken_at,
        moderators,
        stats,
    }))
}

/// Parse `1,4,7` into ids, dropping repeats but keeping first-seen order
///
/// # Errors
///
/// Returns 400 for an empty or oversized list or any id that does not parse.
pub fn parse_ids(raw: &str) -> ApiResult<Vec<ModeratorId>> {
    let mut ids: Vec<ModeratorId> = Vec::new();

    for part in raw.split(',').map(str::trim).filter(|part| !part.is_empty()) {
        let id: ModeratorId = part
            .parse()
            .map_err(|_| ApiError::malformed_id(format!("'{part}' is not a positive integer id")))?;
        if !ids.contains(&id) {
            ids.push(id);
        }
    }

    if ids.is_empty() {
        return Err(ApiError::malformed_input(
            "ids must name at least one moderator",
        ));
    }
    if ids.len() > MAX_COMPARISON_IDS {
        return Err(ApiError::malformed_input(format!(
            "ids may name at most {MAX_COMPARISON_IDS} moderators"
        )));
    }

    Ok(ids)
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn raw_ids(ids: &[ModeratorId]) -> Vec<i64> {
        ids.iter().map(|id| id.get()).collect()
    }

    #[test]
    fn test_parse_ids_keeps_order_and_drops_repeats() {
        let ids = parse_ids(" 3, 1,3 ,2,").unwrap();
        assert_eq!(raw_ids(&ids), vec![3, 1, 2]);
    }

    #[test]
    fn test_parse_ids_rejects_empty_and_malformed() {
        assert_eq!(parse_ids("").unwrap_err().code, "MALFORMED_INPUT");
        assert_eq!(parse_ids(" , ").unwrap_err().code, "MALFORMED_INPUT");
        assert_eq!(parse_ids("1,abc").unwrap_err().code, "MALFORMED_ID");
        assert_eq!(parse_ids("0").unwrap_err().code, "MALFORMED_ID");
    }

    #[test]
    fn test_parse_ids_caps_the_list() {
        let many: Vec<String> = (1..=51).map(|n| n.to_string()).collect();
        let err = parse_ids(&many.join(",")).unwrap_err();
        assert_eq!(err.code, "MALFORMED_INPUT");
        assert!(parse_ids(&many[..50].join(",")).is_ok());
    }
}
