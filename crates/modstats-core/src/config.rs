//! Configuration management for the moderator dashboard

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Record store configuration
    pub database: DatabaseConfig,

    /// Query API configuration
    #[serde(default)]
    pub api: ApiConfig,

    /// Dashboard client configuration
    #[serde(default)]
    pub dashboard: DashboardConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Record store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// `SQLite` URL of the record file
    pub url: String,

    /// Maximum number of connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Connection timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,

    /// Create the record file when it does not exist
    #[serde(default)]
    pub create_if_missing: bool,
}

/// Query API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Enable CORS
    #[serde(default = "default_enable_cors")]
    pub enable_cors: bool,

    /// CORS allowed origins
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Oldest snapshot age, in seconds, that `/api/stats` may be computed from
    #[serde(default = "default_snapshot_max_age")]
    pub snapshot_max_age_secs: u64,

    /// Number of recent snapshots kept addressable by version
    #[serde(default = "default_snapshot_history")]
    pub snapshot_history: usize,

    /// Ranking metric used when a request names none
    #[serde(default = "default_metric")]
    pub default_metric: String,
}

/// Dashboard client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Base URL of the Query API
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    /// Poll interval in seconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// Where the client-local preferences are persisted
    #[serde(default = "default_preferences_path")]
    pub preferences_path: PathBuf,

    /// Ranking metric requested from `/api/stats`
    #[serde(default = "default_metric")]
    pub default_metric: String,

    /// HTTP timeout for a single fetch, in seconds
    #[serde(default = "default_fetch_timeout")]
    pub fetch_timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (json or text)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

fn default_database_url() -> String {
    "sqlite://data/moderators.db".to_string()
}

const fn default_max_connections() -> u32 {
    8
}

const fn default_connect_timeout() -> u64 {
    10
}

const fn default_enable_cors() -> bool {
    true
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

const fn default_request_timeout() -> u64 {
    30
}

const fn default_snapshot_max_age() -> u64 {
    5
}

const fn default_snapshot_history() -> usize {
    4
}

fn default_metric() -> String {
    "total".to_string()
}

fn default_api_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

const fn default_poll_interval() -> u64 {
    30
}

fn default_preferences_path() -> PathBuf {
    PathBuf::from("data/dashboard-preferences.json")
}

const fn default_fetch_timeout() -> u64 {
    10
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        let url = std::env::var("MODSTATS_DATABASE__URL")
            .or_else(|_| std::env::var("DATABASE_URL"))
            .unwrap_or_else(|_| default_database_url());

        Self {
            url,
            max_connections: default_max_connections(),
            connect_timeout: default_connect_timeout(),
            create_if_missing: false,
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enable_cors: default_enable_cors(),
            cors_origins: default_cors_origins(),
            request_timeout_secs: default_request_timeout(),
            snapshot_max_age_secs: default_snapshot_max_age(),
            snapshot_history: default_snapshot_history(),
            default_metric: default_metric(),
        }
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_api_base_url(),
            poll_interval_secs: default_poll_interval(),
            preferences_path: default_preferences_path(),
            default_metric: default_metric(),
            fetch_timeout_secs: default_fetch_timeout(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from an optional `modstats` file and the environment
    ///
    /// Environment keys use the `MODSTATS` prefix and `__` between sections,
    /// e.g. `MODSTATS_API__SNAPSHOT_MAX_AGE_SECS=2`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded or parsed.
    pub fn load() -> crate::Result<Self> {
        Self::load_with(config::File::with_name("modstats").required(false))
    }

    /// Load configuration from an explicit file, still honouring the environment
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing or the configuration cannot be parsed.
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        Self::load_with(config::File::from(path).required(true))
    }

    /// Keep a loaded configuration, or fall back to defaults and hand back the
    /// load error so the caller can log it once logging is up
    #[must_use]
    pub fn or_defaults(loaded: crate::Result<Self>) -> (Self, Option<crate::Error>) {
        match loaded {
            Ok(config) => (config, None),
            Err(err) => (Self::default(), Some(err)),
        }
    }

    fn load_with<S>(file: S) -> crate::Result<Self>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .set_default("database.url", default_database_url())
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix("MODSTATS")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        let config: Self = config
            .try_deserialize()
            .map_err(|e| crate::Error::Configuration {
                message: e.to_string(),
            })?;

        config.validate()?;
        Ok(config)
    }

    /// Check values the rest of the system relies on
    ///
    /// # Errors
    ///
    /// Returns a configuration error naming the first offending key.
    pub fn validate(&self) -> crate::Result<()> {
        let invalid = |message: &str| {
            Err(crate::Error::Configuration {
                message: message.to_string(),
            })
        };

        if self.database.url.is_empty() {
            return invalid("database.url must not be empty");
        }
        if self.api.snapshot_max_age_secs == 0 {
            return invalid("api.snapshot_max_age_secs must be at least 1");
        }
        if self.api.snapshot_history == 0 {
            return invalid("api.snapshot_history must be at least 1");
        }
        if self.dashboard.poll_interval_secs == 0 {
            return invalid("dashboard.poll_interval_secs must be at least 1");
        }
        if self.default_metric_is_malformed() {
            return invalid("api.default_metric and dashboard.default_metric must be valid metric names");
        }

        Ok(())
    }

    fn default_metric_is_malformed(&self) -> bool {
        [&self.api.default_metric, &self.dashboard.default_metric]
            .iter()
            .any(|metric| metric.parse::<crate::aggregate::RankingMetric>().is_err())
    }
}
