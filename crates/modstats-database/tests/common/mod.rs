//! Shared fixtures for record store tests

#![allow(dead_code)]

use modstats_core::Config;
use modstats_database::Database;
use tempfile::TempDir;

/// A migrated record store in a temporary directory
pub struct TestStore {
    pub database: Database,
    pub config: Config,
    _dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.database.url = format!("sqlite://{}", dir.path().join("mods.db").display());
        config.database.create_if_missing = true;

        let database = Database::new(&config).await.expect("Failed to open store");
        database.migrate().await.expect("Failed to migrate");

        Self {
            database,
            config,
            _dir: dir,
        }
    }

    pub fn pool(&self) -> &sqlx::SqlitePool {
        self.database.pool()
    }
}
