//! Chart models derived from a loaded snapshot
//!
//! Charts are plain data. They are built when the view enters `Loaded` or
//! `DetailView` and dropped on every other transition.

use modstats_core::{DashboardStats, ModeratorRecord, utils::humanize_action_key};

/// Leaderboard entries shown in the bar chart
pub const LEADERBOARD_CHART_LEN: usize = 10;

/// One labelled bar
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bar {
    /// Label
    pub label: String,
    /// Value
    pub value: u64,
}

/// A horizontal bar chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BarChart {
    /// Heading
    pub title: String,
    /// Bars in display order
    pub bars: Vec<Bar>,
}

impl BarChart {
    /// Largest value, zero for an empty chart
    #[must_use]
    pub fn max_value(&self) -> u64 {
        self.bars.iter().map(|bar| bar.value).max().unwrap_or(0)
    }

    /// Top of the leaderboard, in leaderboard order
    #[must_use]
    pub fn leaderboard(stats: &DashboardStats) -> Self {
        Self {
            title: format!("Top moderators by {}", humanize_action_key(stats.metric.as_str())),
            bars: stats
                .leaderboard
                .iter()
                .take(LEADERBOARD_CHART_LEN)
                .map(|entry| Bar {
                    label: entry.name.clone(),
                    value: entry.value,
                })
                .collect(),
        }
    }

    /// Per action-type totals, largest first
    #[must_use]
    pub fn totals(stats: &DashboardStats) -> Self {
        let mut bars: Vec<Bar> = stats
            .totals
            .iter()
            .map(|(action, total)| Bar {
                label: humanize_action_key(action),
                value: *total,
            })
            .collect();
        bars.sort_by(|a, b| b.value.cmp(&a.value).then_with(|| a.label.cmp(&b.label)));

        Self {
            title: "Actions by type".to_string(),
            bars,
        }
    }

    /// One moderator's action counts
    #[must_use]
    pub fn detail(record: &ModeratorRecord) -> Self {
        Self {
            title: format!("{} by action type", record.name),
            bars: record
                .action_counts
                .iter()
                .map(|(action, count)| Bar {
                    label: humanize_action_key(action),
                    value: *count,
                })
                .collect(),
        }
    }
}

/// Every chart owned by the view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartSet {
    /// Leaderboard bar chart
    pub leaderboard: BarChart,
    /// Totals bar chart
    pub totals: BarChart,
    /// Detail chart, present only in `DetailView`
    pub detail: Option<BarChart>,
}

impl ChartSet {
    /// Charts for the overview
    #[must_use]
    pub fn overview(stats: &DashboardStats) -> Self {
        Self {
            leaderboard: BarChart::leaderboard(stats),
            totals: BarChart::totals(stats),
            detail: None,
        }
    }

    /// Charts for the overview plus one moderator
    #[must_use]
    pub fn with_detail(stats: &DashboardStats, record: &ModeratorRecord) -> Self {
        Self {
            detail: Some(BarChart::detail(record)),
            ..Self::overview(stats)
        }
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use chrono::Utc;
    use modstats_core::{ModeratorId, RankingMetric, compute_stats};
    use pretty_assertions::assert_eq;

    fn record(id: i64, name: &str, counts: &[(&str, u64)]) -> ModeratorRecord {
        ModeratorRecord {
            id: ModeratorId::new(id).unwrap(),
            name: name.to_string(),
            rank: None,
            status: "active".to_string(),
            action_counts: counts.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_leaderboard_chart_follows_leaderboard() {
        let records = vec![
            record(1, "Alice", &[("warnings", 5)]),
            record(2, "Bob", &[("warnings", 7), ("bans", 1)]),
        ];
        let stats = compute_stats(&records, &RankingMetric::Action("warnings".to_string()));

        let chart = BarChart::leaderboard(&stats);
        assert_eq!(chart.title, "Top moderators by Warnings");
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Bob", "Alice"]);
        assert_eq!(chart.max_value(), 7);
    }

    #[test]
    fn test_totals_chart_sorted_by_value() {
        let records = vec![record(1, "Alice", &[("bans", 2), ("warnings", 9), ("mutes", 2)])];
        let stats = compute_stats(&records, &RankingMetric::Total);

        let chart = BarChart::totals(&stats);
        let labels: Vec<&str> = chart.bars.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["Warnings", "Bans", "Mutes"]);
    }

    #[test]
    fn test_empty_stats_give_empty_charts() {
        let charts = ChartSet::overview(&compute_stats(&[], &RankingMetric::Total));
        assert!(charts.leaderboard.bars.is_empty());
        assert!(charts.totals.bars.is_empty());
        assert_eq!(charts.totals.max_value(), 0);
        assert!(charts.detail.is_none());
    }

    #[test]
    fn test_detail_chart() {
        let alice = record(1, "Alice", &[("warnings", 5)]);
        let stats = compute_stats(std::slice::from_ref(&alice), &RankingMetric::Total);

        let charts = ChartSet::with_detail(&stats, &alice);
        let detail = charts.detail.unwrap();
        assert_eq!(detail.title, "Alice by action type");
        assert_eq!(detail.bars, vec![Bar { label: "Warnings".to_string(), value: 5 }]);
    }
}
