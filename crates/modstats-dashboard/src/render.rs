//! Terminal rendering of the view state

use crate::charts::BarChart;
use crate::preferences::Theme;
use crate::state::{ClientViewState, Phase};
use modstats_core::aggregate::PerformanceTier;
use modstats_core::utils::humanize_action_key;
use modstats_core::{DashboardStats, ModeratorRecord};
use std::fmt::Write;
use tabled::{Table, Tabled, settings::Style};

/// Widest bar drawn, in characters
const BAR_WIDTH: usize = 30;

#[derive(Tabled)]
struct ModeratorRow {
    #[tabled(rename = "ID")]
    id: i64,
    #[tabled(rename = "Moderator")]
    name: String,
    #[tabled(rename = "Rank")]
    rank: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Total")]
    total: u64,
    #[tabled(rename = "Performance")]
    tier: &'static str,
}

impl From<&ModeratorRecord> for ModeratorRow {
    fn from(record: &ModeratorRecord) -> Self {
        let total = record.total_actions();
        Self {
            id: record.id.get(),
            name: format!("[{}] {}", initials(&record.name), record.name),
            rank: record.rank.clone().unwrap_or_else(|| "-".to_string()),
            status: record.status.clone(),
            total,
            tier: PerformanceTier::for_total(total).label(),
        }
    }
}

/// Render the whole dashboard
#[must_use]
pub fn render(state: &ClientViewState) -> String {
    let mut out = String::new();
    header(&mut out, state);

    match state.phase() {
        Phase::Initial => out.push_str("No data requested yet.\n"),
        Phase::Loading => {
            out.push_str("⏳ Loading moderator statistics...\n");
            if let Some(stats) = state.stats() {
                out.push('\n');
                summary(&mut out, stats);
            }
        }
        Phase::Error => {
            error_banner(&mut out, state);
            if let Some(stats) = state.stats() {
                out.push('\n');
                summary(&mut out, stats);
                out.push('\n');
                moderator_table(&mut out, state);
            }
        }
        Phase::Loaded => {
            if let Some(stats) = state.stats() {
                summary(&mut out, stats);
            }
            if let Some(charts) = state.charts() {
                out.push('\n');
                bar_chart(&mut out, &charts.leaderboard, state.theme());
                out.push('\n');
                bar_chart(&mut out, &charts.totals, state.theme());
            }
            out.push('\n');
            moderator_table(&mut out, state);
        }
        Phase::DetailView(_) => {
            if let Some(record) = state.detail_record() {
                detail_panel(&mut out, record, state.stats());
            }
            if let Some(detail) = state.charts().and_then(|charts| charts.detail.as_ref()) {
                out.push('\n');
                bar_chart(&mut out, detail, state.theme());
            }
        }
    }

    out
}

/// Up to two initials, e.g. `"Alice Smith"` gives `"AS"`
#[must_use]
pub fn initials(name: &str) -> String {
    let initials: String = name
        .split_whitespace()
        .filter_map(|word| word.chars().next())
        .take(2)
        .flat_map(char::to_uppercase)
        .collect();

    if initials.is_empty() {
        "?".to_string()
    } else {
        initials
    }
}

fn header(out: &mut String, state: &ClientViewState) {
    let snapshot = state
        .snapshot_version()
        .map_or_else(|| "-".to_string(), |v| format!("v{v}"));
    let _ = writeln!(
        out,
        "📊 Moderator Statistics   snapshot {snapshot}   theme {}",
        state.theme()
    );
    out.push('\n');
}

fn error_banner(out: &mut String, state: &ClientViewState) {
    let reason = state.last_error().unwrap_or("unknown error");
    if state.is_stale() {
        let _ = writeln!(out, "⚠️  Refresh failed, showing stale data: {reason}");
    } else {
        let _ = writeln!(out, "❌ Could not load statistics: {reason}");
    }
    if state.can_retry() {
        out.push_str("   Type 'r' to retry.\n");
    }
}

fn summary(out: &mut String, stats: &DashboardStats) {
    let _ = writeln!(
        out,
        "Moderators: {}   Active: {}   Actions: {}",
        stats.total_moderators, stats.active_moderators, stats.total_actions
    );

    if !stats.rank_breakdown.is_empty() {
        let ranks: Vec<String> = stats
            .rank_breakdown
            .iter()
            .map(|(rank, count)| format!("{rank} {count}"))
            .collect();
        let _ = writeln!(out, "Ranks: {}", ranks.join(", "));
    }
}

fn moderator_table(out: &mut String, state: &ClientViewState) {
    let rows: Vec<ModeratorRow> = state
        .filtered_moderators()
        .into_iter()
        .map(ModeratorRow::from)
        .collect();

    if rows.is_empty() {
        out.push_str("No moderators match the current filters.\n");
        return;
    }

    let shown = rows.len();
    let _ = writeln!(out, "{}", Table::new(rows).with(Style::rounded()));
    let _ = writeln!(
        out,
        "{shown} of {} moderators, sorted by {}",
        state.moderators().len(),
        state.sort()
    );
}

fn detail_panel(out: &mut String, record: &ModeratorRecord, stats: Option<&DashboardStats>) {
    let total = record.total_actions();
    let _ = writeln!(out, "[{}] {} (#{})", initials(&record.name), record.name, record.id);
    let _ = writeln!(
        out,
        "Rank: {}   Status: {}   Total: {total}   {}",
        record.rank.as_deref().unwrap_or("-"),
        record.status,
        PerformanceTier::for_total(total).label()
    );

    if let Some(position) = stats.and_then(|s| s.position_of(record.id)) {
        let _ = writeln!(out, "Leaderboard position: {}", position + 1);
    }

    for (action, count) in &record.action_counts {
        let _ = writeln!(out, "  {:<20} {count}", humanize_action_key(action));
    }

    if let Some(notes) = record.notes.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(out, "Notes: {notes}");
    }
    out.push_str("Type 'close' to return.\n");
}

fn bar_chart(out: &mut String, chart: &BarChart, theme: Theme) {
    let _ = writeln!(out, "{}", chart.title);
    if chart.bars.is_empty() {
        out.push_str("  (no data)\n");
        return;
    }

    let glyph = match theme {
        Theme::Light => "#",
        Theme::Dark => "█",
    };
    let max = chart.max_value();
    let label_width = chart
        .bars
        .iter()
        .map(|bar| bar.label.chars().count())
        .max()
        .unwrap_or(0);

    for bar in &chart.bars {
        let _ = writeln!(
            out,
            "  {:<label_width$} {} {}",
            bar.label,
            glyph.repeat(bar_len(bar.value, max)),
            bar.value
        );
    }
}

fn bar_len(value: u64, max: u64) -> usize {
    if max == 0 {
        return 0;
    }
    let scaled = value.saturating_mul(BAR_WIDTH as u64) / max;
    usize::try_from(scaled).unwrap_or(BAR_WIDTH)
}
