//! Database models for the moderator record store

use chrono::{DateTime, Utc};
use modstats_core::{ActionCounts, Error, ModeratorId, ModeratorRecord, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One row of `moderators` joined with at most one of its action counts
///
/// A moderator with no counts yields a single row with `action_type` and
/// `count` both `NULL`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ModeratorCountRow {
    /// Moderator id
    pub id: i64,

    /// Display name
    pub name: String,

    /// Rank
    pub rank: Option<String>,

    /// Duty status
    pub status: String,

    /// Notes
    pub notes: Option<String>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last write timestamp
    pub updated_at: DateTime<Utc>,

    /// Action type of the joined counter
    pub action_type: Option<String>,

    /// Value of the joined counter
    pub count: Option<i64>,
}

/// Database model for a single action counter
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ActionCountDb {
    /// Owning moderator
    pub moderator_id: i64,

    /// Action type
    pub action_type: String,

    /// Count
    pub count: i64,
}

fn corrupt(what: &str, id: i64) -> Error {
    Error::storage(format!("corrupt {what} stored for moderator {id}"))
}

/// Fold joined rows, ordered by id, into records
///
/// # Errors
///
/// Returns [`Error::StorageUnavailable`] if a stored id or count is out of range.
pub fn fold_rows(rows: Vec<ModeratorCountRow>) -> Result<Vec<ModeratorRecord>> {
    let mut records: Vec<ModeratorRecord> = Vec::new();

    for row in rows {
        let same_as_last = records.last().is_some_and(|r| r.id.get() == row.id);
        if !same_as_last {
            let id = ModeratorId::new(row.id).map_err(|_| corrupt("id", row.id))?;
            records.push(ModeratorRecord {
                id,
                name: row.name,
                rank: row.rank,
                status: row.status,
                action_counts: ActionCounts::new(),
                notes: row.notes,
                created_at: row.created_at,
                updated_at: row.updated_at,
            });
        }

        if let (Some(action), Some(count)) = (row.action_type, row.count) {
            let count = u64::try_from(count).map_err(|_| corrupt("count", row.id))?;
            if let Some(record) = records.last_mut() {
                record.action_counts.insert(action, count);
            }
        }
    }

    Ok(records)
}
