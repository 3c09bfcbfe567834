//! Snapshot cache behaviour against a real store

mod common;

use common::TestApp;
use futures::future::join_all;
use modstats_api::snapshot::{SnapshotCache, SnapshotLookup};
use modstats_core::ModeratorUpsert;
use pretty_assertions::assert_eq;
use std::time::Duration;

#[tokio::test]
async fn test_concurrent_cold_reads_share_one_reload() {
    let app = TestApp::new().await;
    app.seed_three().await;

    let cache = SnapshotCache::new(Duration::from_secs(3600), 4);
    let pool = app.database.pool();

    let snapshots = join_all((0..8).map(|_| cache.current(pool))).await;
    let versions: Vec<u64> = snapshots
        .into_iter()
        .map(|snap| snap.unwrap().version)
        .collect();

    assert_eq!(versions, vec![1; 8]);
    assert!(matches!(cache.get(2), SnapshotLookup::Unknown));
}

#[tokio::test]
async fn test_pinned_snapshot_is_immutable() {
    let app = TestApp::new().await;
    app.seed_three().await;

    let cache = SnapshotCache::new(Duration::from_millis(400), 4);
    let pool = app.database.pool();

    let first = cache.current(pool).await.unwrap();
    app.upsert(ModeratorUpsert::new("Alice").with_count("warnings", 9))
        .await;

    match cache.get(first.version) {
        SnapshotLookup::Found(snap) => assert_eq!(snap.records[0].count("warnings"), 5),
        other => panic!("expected first snapshot to be served, got {other:?}"),
    }

    tokio::time::sleep(Duration::from_millis(450)).await;
    let second = cache.current(pool).await.unwrap();

    assert_eq!(first.records[0].count("warnings"), 5);
    assert_eq!(second.records[0].count("warnings"), 9);
    assert!(matches!(cache.get(first.version), SnapshotLookup::Expired));
}

#[tokio::test]
async fn test_failed_reload_caches_nothing() {
    let app = TestApp::new().await;
    let cache = SnapshotCache::new(Duration::ZERO, 4);

    app.database.close().await;
    let err = cache.current(app.database.pool()).await.unwrap_err();

    assert!(err.is_storage());
    assert!(cache.latest().is_none());
}
