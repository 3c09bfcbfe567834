//! Application state management

use crate::snapshot::SnapshotCache;
use modstats_core::{Config, RankingMetric, context_error, context_error::Result};
use modstats_database::SqlitePool;
use std::time::{Duration, Instant};

/// Shared application state
#[derive(Debug)]
pub struct AppState {
    /// Application configuration
    pub config: Config,
    /// Record store connection pool
    pub pool: SqlitePool,
    /// Versioned record snapshots
    pub snapshots: SnapshotCache,
    /// Metric used when `/api/stats` names none
    pub default_metric: RankingMetric,
    started_at: Instant,
}

impl AppState {
    /// Create new application state
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is inconsistent.
    pub fn new(config: Config, pool: SqlitePool) -> Result<Self> {
        config.validate()?;

        let default_metric = config
            .api
            .default_metric
            .parse()
            .map_err(|e| context_error!("Invalid api.default_metric: {}", e))?;
        let snapshots = SnapshotCache::new(
            Duration::from_secs(config.api.snapshot_max_age_secs),
            config.api.snapshot_history,
        );

        Ok(Self {
            config,
            pool,
            snapshots,
            default_metric,
            started_at: Instant::now(),
        })
    }

    /// Seconds since the state was built
    #[must_use]
    pub fn uptime_seconds(&self) -> u64 {
        self.started_at.elapsed().as_secs()
    }
}
