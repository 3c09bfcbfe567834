//! Record store query operations

use crate::models::{ActionCountDb, ModeratorCountRow, fold_rows};
use chrono::Utc;
use modstats_core::{Error, ModeratorId, ModeratorRecord, ModeratorUpsert, Result};
use sqlx::{Row, SqlitePool, sqlite::SqliteConnection};
use validator::Validate;

const SELECT_JOINED: &str = r"
    SELECT m.id, m.name, m.rank, m.status, m.notes, m.created_at, m.updated_at,
           c.action_type, c.count
    FROM moderators m
    LEFT JOIN moderator_action_counts c ON c.moderator_id = m.id
";

/// Map a read-path driver error; every read failure is a storage failure
fn read_error(e: sqlx::Error) -> Error {
    Error::storage(e.to_string())
}

fn write_error(e: sqlx::Error) -> Error {
    match e.as_database_error() {
        Some(db) if db.is_unique_violation() => Error::Validation {
            field: "name".to_string(),
            message: "another moderator already uses this name".to_string(),
        },
        Some(db) if db.is_check_violation() => Error::Validation {
            field: "action_counts".to_string(),
            message: "counts must be non-negative".to_string(),
        },
        _ => Error::storage(e.to_string()),
    }
}

/// Moderator record operations
#[derive(Debug)]
pub struct ModeratorQueries;

impl ModeratorQueries {
    /// Find a moderator by id
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no record has this id, or
    /// [`Error::StorageUnavailable`] if the query fails.
    pub async fn find_by_id(pool: &SqlitePool, id: ModeratorId) -> Result<ModeratorRecord> {
        let query = format!("{SELECT_JOINED} WHERE m.id = ? ORDER BY c.action_type");

        let rows = sqlx::query_as::<_, ModeratorCountRow>(&query)
            .bind(id.get())
            .fetch_all(pool)
            .await
            .map_err(read_error)?;

        fold_rows(rows)?
            .into_iter()
            .next()
            .ok_or_else(|| Error::NotFound {
                resource: format!("Moderator {id}"),
            })
    }

    /// The record an upsert with this id, or else this name, would update
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the query fails.
    pub async fn find_upsert_target(
        pool: &SqlitePool,
        id: Option<ModeratorId>,
        name: &str,
    ) -> Result<Option<ModeratorRecord>> {
        if let Some(id) = id {
            return match Self::find_by_id(pool, id).await {
                Ok(record) => Ok(Some(record)),
                Err(Error::NotFound { .. }) => Ok(None),
                Err(e) => Err(e),
            };
        }

        let query = format!("{SELECT_JOINED} WHERE m.name = ? ORDER BY c.action_type");
        let rows = sqlx::query_as::<_, ModeratorCountRow>(&query)
            .bind(name)
            .fetch_all(pool)
            .await
            .map_err(read_error)?;

        Ok(fold_rows(rows)?.into_iter().next())
    }

    /// List every moderator ordered by id ascending
    ///
    /// One statement, so the result is a consistent snapshot of the store.
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the query fails.
    pub async fn list_all(pool: &SqlitePool) -> Result<Vec<ModeratorRecord>> {
        let query = format!("{SELECT_JOINED} ORDER BY m.id ASC, c.action_type ASC");

        let rows = sqlx::query_as::<_, ModeratorCountRow>(&query)
            .fetch_all(pool)
            .await
            .map_err(read_error)?;

        tracing::debug!("list_all folded {} joined rows", rows.len());
        fold_rows(rows)
    }

    /// Count moderators
    ///
    /// # Errors
    ///
    /// Returns [`Error::StorageUnavailable`] if the query fails.
    pub async fn count(pool: &SqlitePool) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM moderators")
            .fetch_one(pool)
            .await
            .map_err(read_error)?;

        Ok(row.get("count"))
    }

    /// Insert or update a moderator
    ///
    /// With an id, the record with that id is updated or created under it.
    /// Without one, a record with the same name is updated, otherwise a new
    /// id is assigned. Counts are merged: types absent from `upsert` keep
    /// their stored value, and no stored count may decrease.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for invalid input, a decreasing count or
    /// a name clash, and [`Error::StorageUnavailable`] if the write fails.
    pub async fn upsert(pool: &SqlitePool, upsert: &ModeratorUpsert) -> Result<ModeratorRecord> {
        upsert.validate()?;

        let mut tx = pool.begin().await.map_err(write_error)?;

        let existing = match upsert.id {
            Some(id) => Self::existing_id(&mut tx, id).await?,
            None => Self::existing_name(&mut tx, &upsert.name).await?,
        };

        let now = Utc::now();
        let id = if let Some(id) = existing {
            Self::check_monotonic(&mut tx, id, upsert).await?;

            sqlx::query(
                r"UPDATE moderators
                  SET name = ?, rank = ?, status = ?, notes = ?, updated_at = ?
                  WHERE id = ?",
            )
            .bind(&upsert.name)
            .bind(&upsert.rank)
            .bind(&upsert.status)
            .bind(&upsert.notes)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;

            id
        } else {
            let row = sqlx::query(
                r"INSERT INTO moderators (id, name, rank, status, notes, created_at, updated_at)
                  VALUES (?, ?, ?, ?, ?, ?, ?)
                  RETURNING id",
            )
            .bind(upsert.id.map(ModeratorId::get))
            .bind(&upsert.name)
            .bind(&upsert.rank)
            .bind(&upsert.status)
            .bind(&upsert.notes)
            .bind(now)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(write_error)?;

            row.get::<i64, _>("id")
        };

        for (action, count) in &upsert.action_counts {
            let count = i64::try_from(*count).map_err(|_| Error::Validation {
                field: "action_counts".to_string(),
                message: format!("count for {action} is too large"),
            })?;

            sqlx::query(
                r"INSERT INTO moderator_action_counts (moderator_id, action_type, count)
                  VALUES (?, ?, ?)
                  ON CONFLICT (moderator_id, action_type) DO UPDATE SET count = excluded.count",
            )
            .bind(id)
            .bind(action)
            .bind(count)
            .execute(&mut *tx)
            .await
            .map_err(write_error)?;
        }

        tx.commit().await.map_err(write_error)?;

        let id = ModeratorId::new(id)?;
        tracing::info!("Upserted moderator {} ({})", id, upsert.name);
        Self::find_by_id(pool, id).await
    }

    async fn existing_id(conn: &mut SqliteConnection, id: ModeratorId) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM moderators WHERE id = ?")
            .bind(id.get())
            .fetch_optional(conn)
            .await
            .map_err(read_error)
    }

    async fn existing_name(conn: &mut SqliteConnection, name: &str) -> Result<Option<i64>> {
        sqlx::query_scalar::<_, i64>("SELECT id FROM moderators WHERE name = ?")
            .bind(name)
            .fetch_optional(conn)
            .await
            .map_err(read_error)
    }

    async fn check_monotonic(
        conn: &mut SqliteConnection,
        id: i64,
        upsert: &ModeratorUpsert,
    ) -> Result<()> {
        let stored = sqlx::query_as::<_, ActionCountDb>(
            "SELECT moderator_id, action_type, count FROM moderator_action_counts WHERE moderator_id = ?",
        )
        .bind(id)
        .fetch_all(conn)
        .await
        .map_err(read_error)?;

        for current in stored {
            if let Some(&new) = upsert.action_counts.get(&current.action_type)
                && i64::try_from(new).is_ok_and(|new| new < current.count)
            {
                return Err(Error::Validation {
                    field: "action_counts".to_string(),
                    message: format!(
                        "{} would decrease from {} to {new}",
                        current.action_type, current.count
                    ),
                });
            }
        }

        Ok(())
    }
}

/// Get a moderator by id
///
/// # Errors
///
/// Returns an error if the record is absent or the query fails.
pub async fn get_moderator(pool: &SqlitePool, id: ModeratorId) -> Result<ModeratorRecord> {
    ModeratorQueries::find_by_id(pool, id).await
}

/// Find the record an upsert would update
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn find_upsert_target(
    pool: &SqlitePool,
    id: Option<ModeratorId>,
    name: &str,
) -> Result<Option<ModeratorRecord>> {
    ModeratorQueries::find_upsert_target(pool, id, name).await
}

/// List all moderators ordered by id
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn list_moderators(pool: &SqlitePool) -> Result<Vec<ModeratorRecord>> {
    ModeratorQueries::list_all(pool).await
}

/// Insert or update a moderator
///
/// # Errors
///
/// Returns an error if validation or the write fails.
pub async fn upsert_moderator(
    pool: &SqlitePool,
    upsert: &ModeratorUpsert,
) -> Result<ModeratorRecord> {
    ModeratorQueries::upsert(pool, upsert).await
}

/// Count moderators
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn count_moderators(pool: &SqlitePool) -> Result<i64> {
    ModeratorQueries::count(pool).await
}
