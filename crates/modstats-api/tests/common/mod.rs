//! Shared fixtures for API tests

#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Request, StatusCode},
};
use modstats_api::build_router;
use modstats_core::{Config, ModeratorRecord, ModeratorUpsert};
use modstats_database::{Database, upsert_moderator};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

/// A router over a migrated temporary store
pub struct TestApp {
    pub router: Router,
    pub database: Database,
    _dir: TempDir,
}

/// A buffered response
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Response body is not JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8(self.body.clone()).expect("Response body is not UTF-8")
    }

    pub fn snapshot_version(&self) -> u64 {
        self.headers
            .get("x-snapshot-version")
            .expect("Missing snapshot header")
            .to_str()
            .unwrap()
            .parse()
            .unwrap()
    }
}

impl TestApp {
    /// Default configuration with a long-lived snapshot
    pub async fn new() -> Self {
        Self::with_config(|config| config.api.snapshot_max_age_secs = 3600).await
    }

    /// Start from defaults, then apply `adjust`
    pub async fn with_config(adjust: impl FnOnce(&mut Config)) -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.database.url = format!("sqlite://{}", dir.path().join("mods.db").display());
        config.database.create_if_missing = true;
        adjust(&mut config);

        let database = Database::new(&config).await.expect("Failed to open store");
        database.migrate().await.expect("Failed to migrate");

        let router =
            build_router(config, database.pool().clone()).expect("Failed to build router");

        Self {
            router,
            database,
            _dir: dir,
        }
    }

    pub async fn upsert(&self, input: ModeratorUpsert) -> ModeratorRecord {
        upsert_moderator(self.database.pool(), &input)
            .await
            .expect("Upsert failed")
    }

    /// Alice and Bob tied on five warnings, Carol with three bans
    pub async fn seed_three(&self) {
        self.upsert(
            ModeratorUpsert::new("Alice")
                .with_rank("MOD")
                .with_count("warnings", 5),
        )
        .await;
        self.upsert(
            ModeratorUpsert::new("Bob")
                .with_rank("HELPER")
                .with_count("warnings", 5),
        )
        .await;
        self.upsert(
            ModeratorUpsert::new("Carol")
                .with_rank("MOD")
                .with_status("inactive")
                .with_count("bans", 3),
        )
        .await;
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        let request = Request::builder()
            .uri(uri)
            .body(Body::empty())
            .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router returned an error");

        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body")
            .to_vec();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}
