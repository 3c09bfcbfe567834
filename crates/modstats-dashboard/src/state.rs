//! Dashboard view state machine
//!
//! [`ClientViewState`] is the single owner of everything the dashboard
//! shows. It changes only through [`ClientViewState::handle`], one event at
//! a time, and asks its driver to start a fetch by returning
//! [`Effect::StartFetch`]. The driver never mutates it directly.

use crate::charts::ChartSet;
use crate::filter::{ModeratorFilter, SortSpec, select_rows};
use crate::preferences::{PreferenceStore, Theme};
use modstats_core::{DashboardStats, ModeratorId, ModeratorRecord};
use tracing::{debug, info, warn};

/// One consistent fetch: the records and the statistics computed from them
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashboardData {
    /// Snapshot both halves came from
    pub snapshot_version: u64,
    /// Records ordered by id
    pub moderators: Vec<ModeratorRecord>,
    /// Statistics for exactly those records
    pub stats: DashboardStats,
}

/// Lifecycle phase of the view
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing requested yet
    Initial,
    /// A fetch is in flight
    Loading,
    /// Data is shown
    Loaded,
    /// The last fetch failed
    Error,
    /// One moderator is shown in detail
    DetailView(ModeratorId),
}

/// Something that happened to the dashboard
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Initial page load or a manual refresh
    LoadRequested,
    /// The poll timer fired
    PollTick,
    /// The user asked to retry after an error
    Retry,
    /// A fetch completed
    FetchSucceeded(Box<DashboardData>),
    /// A fetch failed
    FetchFailed(String),
    /// Search text changed
    SearchChanged(String),
    /// Rank filter changed; `None` clears it
    RankFilterChanged(Option<String>),
    /// Status filter changed; `None` clears it
    StatusFilterChanged(Option<String>),
    /// Reset search, rank and status
    ClearFilters,
    /// Sort order changed
    SortChanged(SortSpec),
    /// Show one moderator, now or once it can be resolved
    OpenDetail(ModeratorId),
    /// Leave the detail view
    CloseDetail,
    /// Switch between light and dark
    ToggleTheme,
}

/// Work the driver must perform after an event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch `/api/moderators` then the matching `/api/stats`
    StartFetch,
}

/// Everything the dashboard shows
#[derive(Debug, Clone)]
pub struct ClientViewState {
    phase: Phase,
    moderators: Vec<ModeratorRecord>,
    stats: Option<DashboardStats>,
    snapshot_version: Option<u64>,
    rows: Vec<usize>,
    filter: ModeratorFilter,
    sort: SortSpec,
    theme: Theme,
    pending_detail: Option<ModeratorId>,
    charts: Option<ChartSet>,
    last_error: Option<String>,
}

impl Default for ClientViewState {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientViewState {
    /// Empty state in `Initial`
    #[must_use]
    pub fn new() -> Self {
        Self {
            phase: Phase::Initial,
            moderators: Vec::new(),
            stats: None,
            snapshot_version: None,
            rows: Vec::new(),
            filter: ModeratorFilter::default(),
            sort: SortSpec::default(),
            theme: Theme::default(),
            pending_detail: None,
            charts: None,
            last_error: None,
        }
    }

    /// Current phase
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Last loaded records, ordered by id
    #[must_use]
    pub fn moderators(&self) -> &[ModeratorRecord] {
        &self.moderators
    }

    /// Last loaded statistics
    #[must_use]
    pub const fn stats(&self) -> Option<&DashboardStats> {
        self.stats.as_ref()
    }

    /// Snapshot the shown data came from
    #[must_use]
    pub const fn snapshot_version(&self) -> Option<u64> {
        self.snapshot_version
    }

    /// Records passing the filter, in sort order
    #[must_use]
    pub fn filtered_moderators(&self) -> Vec<&ModeratorRecord> {
        self.rows
            .iter()
            .filter_map(|&idx| self.moderators.get(idx))
            .collect()
    }

    /// Active filter
    #[must_use]
    pub const fn filter(&self) -> &ModeratorFilter {
        &self.filter
    }

    /// Active sort
    #[must_use]
    pub const fn sort(&self) -> &SortSpec {
        &self.sort
    }

    /// Active theme
    #[must_use]
    pub const fn theme(&self) -> Theme {
        self.theme
    }

    /// Moderator id waiting for data it can resolve against
    #[must_use]
    pub const fn pending_detail(&self) -> Option<ModeratorId> {
        self.pending_detail
    }

    /// Charts, present only in `Loaded` and `DetailView`
    #[must_use]
    pub const fn charts(&self) -> Option<&ChartSet> {
        self.charts.as_ref()
    }

    /// Message from the last failed fetch
    #[must_use]
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// In `Error` with earlier data still shown
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.phase == Phase::Error && self.stats.is_some()
    }

    /// A retry is offered
    #[must_use]
    pub fn can_retry(&self) -> bool {
        self.phase == Phase::Error
    }

    /// The record shown in `DetailView`
    #[must_use]
    pub fn detail_record(&self) -> Option<&ModeratorRecord> {
        match self.phase {
            Phase::DetailView(id) => self.find(id),
            _ => None,
        }
    }

    /// Apply one event
    pub fn handle(&mut self, event: Event, prefs: &dyn PreferenceStore) -> Option<Effect> {
        match event {
            Event::LoadRequested | Event::Retry => self.begin_load("load"),
            Event::PollTick => self.begin_load("poll"),
            Event::FetchSucceeded(data) => {
                self.finish_load(*data, prefs);
                None
            }
            Event::FetchFailed(message) => {
                self.fail_load(message);
                None
            }
            Event::SearchChanged(search) => {
                self.filter.search = search;
                self.refresh_rows();
                None
            }
            Event::RankFilterChanged(rank) => {
                self.filter.rank = rank;
                self.refresh_rows();
                None
            }
            Event::StatusFilterChanged(status) => {
                self.filter.status = status;
                self.refresh_rows();
                None
            }
            Event::ClearFilters => {
                self.filter = ModeratorFilter::default();
                self.refresh_rows();
                None
            }
            Event::SortChanged(sort) => {
                self.sort = sort;
                self.refresh_rows();
                None
            }
            Event::OpenDetail(id) => {
                self.pending_detail = Some(id);
                self.resolve_pending();
                None
            }
            Event::CloseDetail => {
                self.pending_detail = None;
                if matches!(self.phase, Phase::DetailView(_)) {
                    self.enter_loaded(prefs);
                }
                None
            }
            Event::ToggleTheme => {
                self.theme = self.theme.toggled();
                if let Err(e) = prefs.set_theme(self.theme) {
                    warn!("Theme not saved: {}", e);
                }
                None
            }
        }
    }

    fn begin_load(&mut self, trigger: &str) -> Option<Effect> {
        if self.phase == Phase::Loading {
            debug!("Ignoring {} trigger while a fetch is in flight", trigger);
            return None;
        }

        if let Phase::DetailView(id) = self.phase {
            self.pending_detail.get_or_insert(id);
        }

        debug!("Starting fetch ({})", trigger);
        self.phase = Phase::Loading;
        self.charts = None;
        Some(Effect::StartFetch)
    }

    fn finish_load(&mut self, data: DashboardData, prefs: &dyn PreferenceStore) {
        if self.phase != Phase::Loading {
            warn!(
                "Dropping fetch result for snapshot v{} outside Loading",
                data.snapshot_version
            );
            return;
        }

        info!(
            "Loaded snapshot v{} with {} moderators",
            data.snapshot_version,
            data.moderators.len()
        );
        self.snapshot_version = Some(data.snapshot_version);
        self.moderators = data.moderators;
        self.stats = Some(data.stats);
        self.last_error = None;
        self.refresh_rows();
        self.enter_loaded(prefs);
        self.resolve_pending();
    }

    fn fail_load(&mut self, message: String) {
        if self.phase != Phase::Loading {
            warn!("Dropping fetch failure outside Loading: {}", message);
            return;
        }

        warn!("Dashboard fetch failed: {}", message);
        self.phase = Phase::Error;
        self.charts = None;
        self.last_error = Some(message);
    }

    fn enter_loaded(&mut self, prefs: &dyn PreferenceStore) {
        self.phase = Phase::Loaded;
        self.theme = prefs.theme();
        self.charts = self.stats.as_ref().map(ChartSet::overview);
    }

    fn resolve_pending(&mut self) {
        let Some(id) = self.pending_detail else {
            return;
        };
        if !matches!(self.phase, Phase::Loaded | Phase::DetailView(_)) {
            debug!("Deferring detail view for moderator {}", id);
            return;
        }

        let charts = match (self.find(id), self.stats.as_ref()) {
            (Some(record), Some(stats)) => ChartSet::with_detail(stats, record),
            _ => {
                debug!("Moderator {} not in snapshot, will retry on next load", id);
                return;
            }
        };

        self.pending_detail = None;
        self.phase = Phase::DetailView(id);
        self.charts = Some(charts);
    }

    fn refresh_rows(&mut self) {
        self.rows = select_rows(&self.moderators, &self.filter, &self.sort);
    }

    fn find(&self, id: ModeratorId) -> Option<&ModeratorRecord> {
        self.moderators
            .binary_search_by_key(&id, |record| record.id)
            .ok()
            .and_then(|idx| self.moderators.get(idx))
    }
}
