//! Shared fixtures for dashboard tests

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use modstats_core::{
    Error, ModeratorId, ModeratorRecord, RankingMetric, Result, compute_stats,
};
use modstats_dashboard::{DashboardData, DashboardSource};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Notify;

pub fn record(id: i64, name: &str, rank: Option<&str>, counts: &[(&str, u64)]) -> ModeratorRecord {
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    ModeratorRecord {
        id: ModeratorId::new(id).unwrap(),
        name: name.to_string(),
        rank: rank.map(str::to_string),
        status: "active".to_string(),
        action_counts: counts.iter().map(|(k, v)| ((*k).to_string(), *v)).collect(),
        notes: None,
        created_at: at,
        updated_at: at,
    }
}

/// Alice, Bob and Carol
pub fn roster() -> Vec<ModeratorRecord> {
    vec![
        record(1, "Alice", Some("MOD"), &[("warnings", 5)]),
        record(2, "Bob", Some("HELPER"), &[("warnings", 5), ("bans", 1)]),
        record(3, "Carol", None, &[("bans", 3)]),
    ]
}

pub fn data(version: u64, moderators: Vec<ModeratorRecord>) -> DashboardData {
    let stats = compute_stats(&moderators, &RankingMetric::Total);
    DashboardData {
        snapshot_version: version,
        moderators,
        stats,
    }
}

/// A data source that replays queued responses
///
/// When gated, every fetch waits for [`ScriptedSource::release`] before
/// answering.
#[derive(Default)]
pub struct ScriptedSource {
    responses: Mutex<VecDeque<Result<DashboardData>>>,
    calls: AtomicUsize,
    gate: Option<Notify>,
}

impl ScriptedSource {
    pub fn new(responses: impl IntoIterator<Item = Result<DashboardData>>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn gated(responses: impl IntoIterator<Item = Result<DashboardData>>) -> Self {
        Self {
            gate: Some(Notify::new()),
            ..Self::new(responses)
        }
    }

    pub fn push(&self, response: Result<DashboardData>) {
        self.responses.lock().push_back(response);
    }

    pub fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.notify_one();
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DashboardSource for ScriptedSource {
    async fn fetch_dashboard(&self, _metric: &RankingMetric) -> Result<DashboardData> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.responses
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(Error::network("no scripted response")))
    }
}
