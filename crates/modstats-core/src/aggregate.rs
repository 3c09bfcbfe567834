//! Aggregation of moderator records into dashboard statistics
//!
//! Everything here is a pure function of its input: the same ordered slice
//! of records always yields an identical [`DashboardStats`]. No timestamps
//! or other ambient state enter the result.

use crate::types::{ModeratorId, ModeratorRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Name of the synthetic metric that sums every action type of a record
pub const TOTAL_METRIC: &str = "total";

/// Rank bucket for records without a rank
pub const UNRANKED: &str = "unranked";

/// What the leaderboard is ranked by
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RankingMetric {
    /// Sum of all action counts
    #[default]
    Total,
    /// A single action type
    Action(String),
}

impl RankingMetric {
    /// Project a record onto this metric; absent action types count as zero
    #[must_use]
    pub fn value_of(&self, record: &ModeratorRecord) -> u64 {
        match self {
            Self::Total => record.total_actions(),
            Self::Action(action) => record.count(action),
        }
    }

    /// Display name, as accepted by [`FromStr`]
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Total => TOTAL_METRIC,
            Self::Action(action) => action,
        }
    }
}

impl fmt::Display for RankingMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RankingMetric {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        if s == TOTAL_METRIC {
            Ok(Self::Total)
        } else if crate::utils::is_valid_action_key(s) {
            Ok(Self::Action(s.to_string()))
        } else {
            Err(crate::Error::malformed(
                "metric",
                format!("'{s}' is not a valid metric name"),
            ))
        }
    }
}

impl TryFrom<String> for RankingMetric {
    type Error = crate::Error;

    fn try_from(value: String) -> crate::Result<Self> {
        value.parse()
    }
}

impl From<RankingMetric> for String {
    fn from(metric: RankingMetric) -> Self {
        match metric {
            RankingMetric::Total => TOTAL_METRIC.to_string(),
            RankingMetric::Action(action) => action,
        }
    }
}

/// One ranked row of the leaderboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    /// Moderator id
    pub moderator_id: ModeratorId,
    /// Moderator display name at snapshot time
    pub name: String,
    /// Metric the value was projected from
    pub metric: RankingMetric,
    /// Projected value
    pub value: u64,
}

/// Summary statistics derived from a record snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Number of records in the snapshot
    pub total_moderators: u64,
    /// Records whose status is `active`
    pub active_moderators: u64,
    /// Sum of every action count across all records
    pub total_actions: u64,
    /// Per action-type sums
    pub totals: BTreeMap<String, u64>,
    /// Record count per rank, `unranked` for records without one
    pub rank_breakdown: BTreeMap<String, u64>,
    /// Metric the leaderboard is ranked by
    pub metric: RankingMetric,
    /// Value descending, ties by ascending id
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl DashboardStats {
    /// Sum for one action type, zero when no record carries it
    #[must_use]
    pub fn total(&self, action: &str) -> u64 {
        self.totals.get(action).copied().unwrap_or(0)
    }

    /// Keep only the first `limit` leaderboard entries
    pub fn truncate_leaderboard(&mut self, limit: usize) {
        self.leaderboard.truncate(limit);
    }

    /// Rank of a moderator on the leaderboard, 1-based
    #[must_use]
    pub fn position_of(&self, id: ModeratorId) -> Option<usize> {
        self.leaderboard
            .iter()
            .position(|entry| entry.moderator_id == id)
            .map(|idx| idx + 1)
    }
}

/// Compute totals and the ranked leaderboard for `records`
///
/// Every record appears on the leaderboard. Empty input gives zero counts,
/// empty maps and an empty leaderboard.
#[must_use]
pub fn compute_stats(records: &[ModeratorRecord], metric: &RankingMetric) -> DashboardStats {
    let mut totals: BTreeMap<String, u64> = BTreeMap::new();
    let mut rank_breakdown: BTreeMap<String, u64> = BTreeMap::new();
    let mut active_moderators = 0_u64;

    for record in records {
        for (action, count) in &record.action_counts {
            let slot = totals.entry(action.clone()).or_insert(0);
            *slot = slot.saturating_add(*count);
        }

        let rank = record.rank.as_deref().unwrap_or(UNRANKED);
        *rank_breakdown.entry(rank.to_string()).or_insert(0) += 1;

        if record.is_active() {
            active_moderators += 1;
        }
    }

    let total_actions = totals
        .values()
        .fold(0_u64, |acc, n| acc.saturating_add(*n));

    let mut leaderboard: Vec<LeaderboardEntry> = records
        .iter()
        .map(|record| LeaderboardEntry {
            moderator_id: record.id,
            name: record.name.clone(),
            metric: metric.clone(),
            value: metric.value_of(record),
        })
        .collect();

    leaderboard.sort_by(|a, b| {
        b.value
            .cmp(&a.value)
            .then_with(|| a.moderator_id.cmp(&b.moderator_id))
    });

    DashboardStats {
        total_moderators: records.len() as u64,
        active_moderators,
        total_actions,
        totals,
        rank_breakdown,
        metric: metric.clone(),
        leaderboard,
    }
}

/// Coarse performance band for a moderator's total actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerformanceTier {
    /// 50 or more actions
    Excellent,
    /// 25 to 49 actions
    Good,
    /// Fewer than 25 actions
    NeedsImprovement,
}

impl PerformanceTier {
    /// Band for a total action count
    #[must_use]
    pub const fn for_total(total: u64) -> Self {
        match total {
            50.. => Self::Excellent,
            25..=49 => Self::Good,
            _ => Self::NeedsImprovement,
        }
    }

    /// Human label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Excellent => "Excellent",
            Self::Good => "Good",
            Self::NeedsImprovement => "Needs Improvement",
        }
    }
}
