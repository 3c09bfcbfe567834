//! `SQLite` record store for moderator statistics
//!
//! The store is the single source of truth for [`ModeratorRecord`]s. Reads
//! never mutate it; [`upsert_moderator`] exists for the admin tool.
//!
//! [`ModeratorRecord`]: modstats_core::ModeratorRecord

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

pub mod models;
pub mod queries;
pub mod seed;

// Re-export convenience functions
pub use queries::{
    ModeratorQueries, count_moderators, find_upsert_target, get_moderator, list_moderators,
    upsert_moderator,
};

use modstats_core::{Config, Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;

// Re-export SqlitePool for convenience
pub use sqlx::SqlitePool;

/// Record store connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open the record store described by `config.database`
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the file cannot be opened,
    /// including when it is missing and `create_if_missing` is off.
    pub async fn new(config: &Config) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database.url)
            .map_err(|e| Error::Configuration {
                message: format!("Invalid database URL {}: {e}", config.database.url),
            })?
            .create_if_missing(config.database.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(Duration::from_secs(5));

        if config.database.create_if_missing
            && let Some(parent) = options
                .get_filename()
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
        {
            std::fs::create_dir_all(parent).map_err(|e| {
                Error::storage(format!("Cannot create {}: {e}", parent.display()))
            })?;
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.database.max_connections)
            .acquire_timeout(Duration::from_secs(config.database.connect_timeout))
            .connect_with(options)
            .await
            .map_err(|e| {
                Error::storage(format!("cannot open {}: {e}", config.database.url))
            })?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool
    #[must_use]
    pub const fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Get a reference to the connection pool
    #[must_use]
    pub const fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if migrations fail to run.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::storage(format!("Migration failed: {e}")))?;

        Ok(())
    }

    /// Health check
    ///
    /// # Errors
    ///
    /// Returns an error if the health check fails.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| Error::storage(format!("Health check failed: {e}")))?;

        Ok(())
    }

    /// Close every pooled connection
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_for(url: String, create: bool) -> Config {
        let mut config = Config::default();
        config.database.url = url;
        config.database.create_if_missing = create;
        config.database.connect_timeout = 2;
        config
    }

    #[tokio::test]
    async fn test_missing_file_is_storage_unavailable() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("absent.db").display());

        let err = Database::new(&config_for(url, false)).await.unwrap_err();
        assert!(err.is_storage(), "expected StorageUnavailable, got {err:?}");
    }

    #[tokio::test]
    async fn test_unopenable_directory_is_storage_unavailable() {
        let url = "sqlite:///nonexistent/dir/that/should/not/exist/mods.db".to_string();

        let err = Database::new(&config_for(url, true)).await.unwrap_err();
        assert!(err.is_storage());
    }

    #[tokio::test]
    async fn test_create_migrate_and_health_check() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("mods.db").display());

        let db = Database::new(&config_for(url, true)).await.unwrap();
        db.migrate().await.unwrap();
        db.health_check().await.unwrap();
        db.migrate().await.unwrap();

        assert_eq!(count_moderators(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_health_check_after_close_fails() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("mods.db").display());

        let db = Database::new(&config_for(url, true)).await.unwrap();
        db.close().await;

        let err = db.health_check().await.unwrap_err();
        assert!(err.to_string().contains("Health check failed"));
    }
}
