//! Write-side administration tool for the moderator record store

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]

use clap::{Parser, Subcommand};
use modstats_core::context_error::{ContextError, Result};
use modstats_core::utils::parse_action_pair;
use modstats_core::{Config, ModeratorId, ModeratorRecord, ModeratorUpsert, init_logging};
use modstats_database::{
    Database, find_upsert_target, list_moderators, seed::seed_roster, upsert_moderator,
};
use std::path::PathBuf;
use tabled::{Table, Tabled, settings::Style};
use tracing::{info, warn};

/// Command line interface for the record store
#[derive(Parser)]
#[command(
    name = "modstats-admin",
    version = env!("CARGO_PKG_VERSION"),
    about = "Maintain the moderator record store"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override `database.url`
    #[arg(long, env = "MODSTATS_DATABASE__URL")]
    database_url: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
enum Commands {
    /// Create the record file if needed and apply migrations
    Migrate,

    /// Insert or update one moderator
    ///
    /// Omitted rank, status and notes keep their stored values; an empty
    /// `--rank` or `--notes` clears them.
    Upsert(UpsertArgs),

    /// Print every moderator
    List {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Upsert the starting roster
    Seed,
}

#[derive(clap::Args, Debug, Default)]
struct UpsertArgs {
    /// Existing id to update
    #[arg(long)]
    id: Option<i64>,

    /// Display name
    #[arg(long)]
    name: String,

    /// Rank
    #[arg(long)]
    rank: Option<String>,

    /// Status, `active` for a new moderator
    #[arg(long)]
    status: Option<String>,

    /// Notes
    #[arg(long)]
    notes: Option<String>,

    /// Action count as `type=count`, repeatable
    #[arg(short, long = "action", value_name = "TYPE=COUNT")]
    actions: Vec<String>,
}

impl UpsertArgs {
    fn target_id(&self) -> Result<Option<ModeratorId>> {
        Ok(self.id.map(ModeratorId::new).transpose()?)
    }

    /// Build the write, filling omitted fields from the stored record
    fn into_upsert(self, stored: Option<&ModeratorRecord>) -> Result<ModeratorUpsert> {
        let mut upsert = ModeratorUpsert::new(&self.name);
        if let Some(id) = self.target_id()? {
            upsert = upsert.with_id(id);
        }

        upsert.rank = keep_or_replace(self.rank, stored.and_then(|r| r.rank.clone()));
        upsert.notes = keep_or_replace(self.notes, stored.and_then(|r| r.notes.clone()));
        if let Some(status) = self.status.or_else(|| stored.map(|r| r.status.clone())) {
            upsert = upsert.with_status(status);
        }

        for pair in &self.actions {
            let (action, count) = parse_action_pair(pair)?;
            upsert = upsert.with_count(action, count);
        }

        Ok(upsert)
    }
}

/// `None` keeps the stored value, an empty string clears it
fn keep_or_replace(given: Option<String>, stored: Option<String>) -> Option<String> {
    match given {
        Some(value) if value.is_empty() => None,
        Some(value) => Some(value),
        None => stored,
    }
}

#[derive(Tabled)]
struct ModeratorRow {
    id: i64,
    name: String,
    rank: String,
    status: String,
    total: u64,
    counts: String,
}

impl From<&ModeratorRecord> for ModeratorRow {
    fn from(record: &ModeratorRecord) -> Self {
        Self {
            id: record.id.get(),
            name: record.name.clone(),
            rank: record.rank.clone().unwrap_or_default(),
            status: record.status.clone(),
            total: record.total_actions(),
            counts: record
                .action_counts
                .iter()
                .map(|(action, count)| format!("{action}={count}"))
                .collect::<Vec<_>>()
                .join(" "),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("Note: .env file not loaded: {e}");
    }

    let cli = Cli::parse();

    let (mut config, load_error) = match &cli.config {
        Some(path) => (Config::load_from(path)?, None),
        None => Config::or_defaults(Config::load()),
    };
    if let Some(url) = cli.database_url {
        config.database.url = url;
    }
    config.logging.level.clone_from(&cli.log_level);
    config.logging.format = "text".to_string();
    init_logging(&config.logging)?;

    if let Some(err) = load_error {
        warn!("Failed to load config ({}), using defaults", err);
    }

    // The admin tool owns the write path, so it may create the file.
    config.database.create_if_missing = true;
    let database = Database::new(&config).await?;
    database.migrate().await?;

    match cli.command {
        Commands::Migrate => {
            info!("Migrations applied to {}", config.database.url);
            println!("Record store ready at {}", config.database.url);
        }
        Commands::Upsert(args) => {
            let stored =
                find_upsert_target(database.pool(), args.target_id()?, &args.name).await?;
            let upsert = args.into_upsert(stored.as_ref())?;

            let record = upsert_moderator(database.pool(), &upsert).await?;
            println!("{}", Table::new([ModeratorRow::from(&record)]).with(Style::rounded()));
        }
        Commands::List { json } => {
            let records = list_moderators(database.pool()).await?;
            if json {
                let out = serde_json::to_string_pretty(&records)
                    .map_err(|e| ContextError::with_context(e, "Serializing moderators"))?;
                println!("{out}");
            } else {
                let rows: Vec<ModeratorRow> = records.iter().map(ModeratorRow::from).collect();
                println!("{}", Table::new(rows).with(Style::rounded()));
            }
        }
        Commands::Seed => {
            let summary = seed_roster(database.pool()).await?;
            println!(
                "Roster seeded: {} created, {} updated",
                summary.created, summary.updated
            );
        }
    }

    database.close().await;
    Ok(())
}
