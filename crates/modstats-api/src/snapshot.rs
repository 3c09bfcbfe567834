//! Versioned, bounded-staleness snapshots of the record store
//!
//! Every read of the full record list becomes an immutable [`Snapshot`]
//! with a monotonically increasing version. `/api/moderators` hands out the
//! version it served, and `/api/stats?snapshot=N` computes from exactly that
//! snapshot, so a client that asks for both in one refresh gets statistics
//! that match the list it is showing.
//!
//! No request sees a snapshot older than the configured max age. Unpinned
//! requests past the bound trigger a reload; pinned requests past it get
//! [`SnapshotLookup::Expired`] and the client refetches the pair. Reloads are
//! serialized so a burst of stale requests costs one store read.

use chrono::{DateTime, Utc};
use modstats_core::{ModeratorRecord, Result};
use modstats_database::{SqlitePool, list_moderators};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info};

/// An immutable, versioned copy of the full record list
#[derive(Debug)]
pub struct Snapshot {
    /// Version handed to clients, starting at 1
    pub version: u64,
    /// Wall-clock time the records were read
    pub taken_at: DateTime<Utc>,
    loaded: Instant,
    /// Records ordered by id ascending
    pub records: Arc<[ModeratorRecord]>,
}

impl Snapshot {
    /// Time since the records were read
    #[must_use]
    pub fn age(&self) -> Duration {
        self.loaded.elapsed()
    }
}

/// Result of looking up a snapshot by version
#[derive(Debug, Clone)]
pub enum SnapshotLookup {
    /// Still retained
    Found(Arc<Snapshot>),
    /// Was issued but has been evicted or is older than the max age
    Expired,
    /// Never issued by this process
    Unknown,
}

#[derive(Debug, Default)]
struct History {
    last_version: u64,
    entries: VecDeque<Arc<Snapshot>>,
}

/// Snapshot cache shared by all handlers
#[derive(Debug)]
pub struct SnapshotCache {
    history: RwLock<History>,
    reload: Mutex<()>,
    max_age: Duration,
    capacity: usize,
}

impl SnapshotCache {
    /// New empty cache; `capacity` is clamped to at least one snapshot
    #[must_use]
    pub fn new(max_age: Duration, capacity: usize) -> Self {
        Self {
            history: RwLock::new(History::default()),
            reload: Mutex::new(()),
            max_age,
            capacity: capacity.max(1),
        }
    }

    /// Maximum age of any snapshot served
    #[must_use]
    pub const fn max_age(&self) -> Duration {
        self.max_age
    }

    /// Newest snapshot if it is still within the max age
    #[must_use]
    pub fn fresh(&self) -> Option<Arc<Snapshot>> {
        self.history
            .read()
            .entries
            .back()
            .filter(|snap| snap.age() < self.max_age)
            .cloned()
    }

    /// Newest snapshot regardless of age
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Snapshot>> {
        self.history.read().entries.back().cloned()
    }

    /// A snapshot no older than the max age, reloading from the store if needed
    ///
    /// # Errors
    ///
    /// Returns the store error if a reload is needed and fails; nothing is
    /// cached in that case.
    pub async fn current(&self, pool: &SqlitePool) -> Result<Arc<Snapshot>> {
        if let Some(snap) = self.fresh() {
            return Ok(snap);
        }

        let _guard = self.reload.lock().await;

        // Another request may have reloaded while this one waited.
        if let Some(snap) = self.fresh() {
            return Ok(snap);
        }

        let started = Instant::now();
        let records = list_moderators(pool).await?;
        let snap = self.push(records);

        info!(
            "Loaded snapshot v{} with {} moderators in {}ms",
            snap.version,
            snap.records.len(),
            started.elapsed().as_millis()
        );
        Ok(snap)
    }

    /// Look up a previously issued snapshot
    ///
    /// A retained snapshot at or past the max age is [`SnapshotLookup::Expired`]
    /// just like an evicted one.
    #[must_use]
    pub fn get(&self, version: u64) -> SnapshotLookup {
        let history = self.history.read();

        if version == 0 || version > history.last_version {
            return SnapshotLookup::Unknown;
        }

        history
            .entries
            .iter()
            .find(|snap| snap.version == version)
            .filter(|snap| snap.age() < self.max_age)
            .map_or(SnapshotLookup::Expired, |snap| {
                SnapshotLookup::Found(Arc::clone(snap))
            })
    }

    fn push(&self, records: Vec<ModeratorRecord>) -> Arc<Snapshot> {
        self.push_loaded_at(records, Instant::now())
    }

    fn push_loaded_at(&self, records: Vec<ModeratorRecord>, loaded: Instant) -> Arc<Snapshot> {
        let mut history = self.history.write();
        history.last_version += 1;

        let snap = Arc::new(Snapshot {
            version: history.last_version,
            taken_at: Utc::now(),
            loaded,
            records: records.into(),
        });

        history.entries.push_back(Arc::clone(&snap));
        while history.entries.len() > self.capacity {
            if let Some(evicted) = history.entries.pop_front() {
                debug!("Evicted snapshot v{}", evicted.version);
            }
        }

        snap
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_versions_increase_and_history_is_bounded() {
        let cache = SnapshotCache::new(Duration::from_secs(60), 2);

        let v1 = cache.push(Vec::new());
        let v2 = cache.push(Vec::new());
        let v3 = cache.push(Vec::new());

        assert_eq!((v1.version, v2.version, v3.version), (1, 2, 3));
        assert!(matches!(cache.get(1), SnapshotLookup::Expired));
        assert!(matches!(cache.get(2), SnapshotLookup::Found(ref s) if s.version == 2));
        assert!(matches!(cache.get(3), SnapshotLookup::Found(_)));
        assert!(matches!(cache.get(4), SnapshotLookup::Unknown));
        assert!(matches!(cache.get(0), SnapshotLookup::Unknown));
    }

    #[test]
    fn test_zero_max_age_is_never_fresh() {
        let cache = SnapshotCache::new(Duration::ZERO, 4);
        cache.push(Vec::new());

        assert!(cache.fresh().is_none());
        assert!(cache.latest().is_some());
    }

    #[test]
    fn test_fresh_within_max_age() {
        let cache = SnapshotCache::new(Duration::from_secs(3600), 4);
        assert!(cache.fresh().is_none());

        cache.push(Vec::new());
        assert_eq!(cache.fresh().map(|s| s.version), Some(1));
    }

    #[test]
    fn test_retained_snapshot_past_max_age_is_expired() {
        let cache = SnapshotCache::new(Duration::from_secs(60), 4);
        let old = Instant::now().checked_sub(Duration::from_secs(61)).unwrap();

        cache.push_loaded_at(Vec::new(), old);
        cache.push(Vec::new());

        assert!(matches!(cache.get(1), SnapshotLookup::Expired));
        assert!(matches!(cache.get(2), SnapshotLookup::Found(_)));
        assert_eq!(cache.latest().map(|s| s.version), Some(2));
    }

    #[test]
    fn test_zero_max_age_never_serves_a_pin() {
        let cache = SnapshotCache::new(Duration::ZERO, 4);
        cache.push(Vec::new());

        assert!(matches!(cache.get(1), SnapshotLookup::Expired));
    }

    #[test]
    fn test_capacity_is_at_least_one() {
        let cache = SnapshotCache::new(Duration::from_secs(60), 0);
        cache.push(Vec::new());
        assert!(matches!(cache.get(1), SnapshotLookup::Found(_)));
    }
}
