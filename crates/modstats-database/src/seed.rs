//! Starting roster for a fresh record store

use crate::queries::ModeratorQueries;
use modstats_core::{ModeratorUpsert, Result};
use sqlx::SqlitePool;
use std::collections::HashSet;

/// `(name, notes)` for each moderator on the starting roster, all rank `Mod`
pub const ROSTER: &[(&str, &str)] = &[
    ("Alexa", "SkyBlock Moderator"),
    ("AmyTheMudkip", "Report Moderator"),
    ("Blake", "SkyBlock Moderator"),
    ("Changitesz", "Report Moderator"),
    ("DeluxeRose", "Report Moderator"),
    ("Gainful", "Report Moderator"),
    ("Gerbor", "SkyBlock Moderator"),
    ("Jade", "Report Moderator"),
    ("LeBrilliant", "Report Moderator"),
    ("Quack", "Forum & Report Moderator"),
    ("Rhune", "SkyBlock Moderator"),
    ("SaltyLia", "Report & SkyBlock Moderator"),
    ("Smoarzified", "Appeals & SkyBlock Moderator"),
    ("MCVisuals", "Appeals & Report Moderator"),
];

/// Outcome of a seeding run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    /// Records inserted
    pub created: usize,
    /// Existing records whose rank, status and notes were reset
    pub updated: usize,
}

/// Upsert every roster entry by name
///
/// Stored action counts are left untouched, so seeding is idempotent.
///
/// # Errors
///
/// Returns an error if any upsert fails.
pub async fn seed_roster(pool: &SqlitePool) -> Result<SeedSummary> {
    let known: HashSet<String> = ModeratorQueries::list_all(pool)
        .await?
        .into_iter()
        .map(|record| record.name)
        .collect();

    let mut summary = SeedSummary::default();
    for (name, notes) in ROSTER {
        let upsert = ModeratorUpsert::new(*name).with_rank("Mod").with_notes(*notes);
        ModeratorQueries::upsert(pool, &upsert).await?;

        if known.contains(*name) {
            summary.updated += 1;
        } else {
            summary.created += 1;
        }
    }

    tracing::info!(
        "Seeded roster: {} created, {} updated",
        summary.created,
        summary.updated
    );
    Ok(summary)
}
