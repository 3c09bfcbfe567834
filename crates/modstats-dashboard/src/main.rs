//! Terminal dashboard for the moderator statistics API

use clap::Parser;
use modstats_core::context_error::{ContextError, Result};
use modstats_core::{Config, ModeratorId, RankingMetric, init_logging};
use modstats_dashboard::commands::{Command, HELP, parse_command};
use modstats_dashboard::filter::SortSpec;
use modstats_dashboard::render::render;
use modstats_dashboard::{
    ApiClient, ClientOptions, DashboardClient, DashboardLink, Event, JsonFilePreferences, Phase,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use url::Url;

/// Command line interface for the dashboard
#[derive(Parser)]
#[command(
    name = "modstats-dashboard",
    version = env!("CARGO_PKG_VERSION"),
    about = "Live moderator statistics in the terminal"
)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Dashboard link, e.g. `http://127.0.0.1:3000/?mod=2`
    #[arg(long, value_name = "URL")]
    url: Option<String>,

    /// Moderator to open once data has loaded
    #[arg(short, long, value_name = "ID")]
    moderator: Option<ModeratorId>,

    /// Leaderboard metric, `total` or an action type
    #[arg(long)]
    metric: Option<RankingMetric>,

    /// Initial search text
    #[arg(long)]
    search: Option<String>,

    /// Initial rank filter
    #[arg(long)]
    rank: Option<String>,

    /// Initial status filter
    #[arg(long)]
    status: Option<String>,

    /// Initial sort, `key[:asc|desc]`
    #[arg(long, value_name = "KEY[:DIR]")]
    sort: Option<SortSpec>,

    /// Load once, print, and exit
    #[arg(long)]
    once: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "warn")]
    log_level: String,
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
    config.logging.level.clone_from(&cli.log_level);
    init_logging(&config.logging)?;

    if let Some(err) = load_error {
        warn!("Failed to load config ({}), using defaults", err);
    }

    let (api_base, linked) = match &cli.url {
        Some(raw) => {
            let link = DashboardLink::parse(raw)?;
            (link.api_base, link.moderator)
        }
        None => {
            let base = Url::parse(&config.dashboard.api_base_url).map_err(|e| {
                ContextError::with_context(e, "Invalid dashboard.api_base_url")
            })?;
            (base, None)
        }
    };

    let metric = match cli.metric {
        Some(metric) => metric,
        None => config.dashboard.default_metric.parse::<RankingMetric>()?,
    };

    let source = ApiClient::new(
        api_base,
        Duration::from_secs(config.dashboard.fetch_timeout_secs),
    )?;
    info!("Dashboard reading from {}", source.base_url());
    let exporter = source.clone();

    let prefs = JsonFilePreferences::open(config.dashboard.preferences_path.clone());
    let options = ClientOptions {
        poll_interval: Duration::from_secs(config.dashboard.poll_interval_secs),
        metric,
        initial_detail: cli.moderator.or(linked),
    };
    let mut client = DashboardClient::new(Arc::new(source), prefs, options);

    if let Some(search) = cli.search {
        client.dispatch(Event::SearchChanged(search));
    }
    if cli.rank.is_some() {
        client.dispatch(Event::RankFilterChanged(cli.rank));
    }
    if cli.status.is_some() {
        client.dispatch(Event::StatusFilterChanged(cli.status));
    }
    if let Some(sort) = cli.sort {
        client.dispatch(Event::SortChanged(sort));
    }

    client.start();

    if cli.once {
        client.settle().await;
        println!("{}", render(client.state()));
        let failed = client.state().phase() == Phase::Error;
        client.shutdown().await;
        if failed {
            return Err(ContextError::new("Dashboard could not load statistics"));
        }
        return Ok(());
    }

    run_interactive(&mut client, &exporter).await;
    client.shutdown().await;
    Ok(())
}

async fn run_interactive(
    client: &mut DashboardClient<ApiClient, JsonFilePreferences>,
    exporter: &ApiClient,
) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut notice: Option<String> = Some("Type 'help' for commands.".to_string());
    redraw(client, notice.as_deref());

    loop {
        tokio::select! {
            alive = client.process_next() => {
                if !alive {
                    break;
                }
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        warn!("Stdin closed: {}", e);
                        break;
                    }
                };
                notice = None;
                match parse_command(&line) {
                    Ok(Command::Dispatch(event)) => client.dispatch(event),
                    Ok(Command::Export(id)) => notice = Some(save_export(exporter, id).await),
                    Ok(Command::Visibility(visible)) => client.set_visible(visible),
                    Ok(Command::Help) => notice = Some(HELP.to_string()),
                    Ok(Command::Quit) => break,
                    Ok(Command::Nothing) => {}
                    Err(e) => notice = Some(e.to_string()),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping dashboard");
                break;
            }
        }

        redraw(client, notice.as_deref());
    }
}

async fn save_export(exporter: &ApiClient, id: Option<ModeratorId>) -> String {
    let saved = match exporter.export_csv(id).await {
        Ok(export) => export.save_in(Path::new(".")).await,
        Err(e) => Err(e),
    };

    match saved {
        Ok(path) => format!("Export saved to {}", path.display()),
        Err(e) => {
            warn!("Export failed: {}", e);
            format!("Export failed: {e}")
        }
    }
}

fn redraw(client: &DashboardClient<ApiClient, JsonFilePreferences>, notice: Option<&str>) {
    // Clear the screen and home the cursor.
    print!("\x1b[2J\x1b[H");
    println!("{}", render(client.state()));
    if !client.is_polling() {
        println!("⏸  Polling paused, type 'resume' to continue.");
    }
    if let Some(notice) = notice {
        println!("{notice}");
    }
    print!("> ");
    let _ = std::io::Write::flush(&mut std::io::stdout());
}
