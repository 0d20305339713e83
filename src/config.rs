//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use crate::analysis::CycleParams;
use crate::calendar::Clock;
use crate::source::{DateSource, HttpSource, HttpSourceConfig, MemorySource, SourceResult, SqliteSource};
use crate::tracker::MutationPolicy;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub source: SourceConfig,

    #[serde(default)]
    pub cycle: CycleParams,

    #[serde(default)]
    pub tracker: TrackerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Which backend holds the recorded dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Memory,
    #[default]
    Sqlite,
    Http,
}

impl std::str::FromStr for SourceKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(SourceKind::Memory),
            "sqlite" => Ok(SourceKind::Sqlite),
            "http" => Ok(SourceKind::Http),
            other => Err(ConfigError::Invalid(format!("unknown source kind: {}", other))),
        }
    }
}

/// Date source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Subject whose dates are tracked (SQLite backend)
    #[serde(default = "default_user_id")]
    pub user_id: String,

    /// Base URL of the dates API (HTTP backend)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token for the dates API
    pub token: Option<String>,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_database_path() -> String {
    dirs::data_local_dir()
        .map(|p| p.join("cycletrack").join("cycles.db").to_string_lossy().to_string())
        .unwrap_or_else(|| "./cycletrack_data/cycles.db".to_string())
}

fn default_user_id() -> String {
    "default".to_string()
}

fn default_base_url() -> String {
    "http://localhost:3000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            database_path: default_database_path(),
            user_id: default_user_id(),
            base_url: default_base_url(),
            token: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl SourceConfig {
    /// Build the configured backend
    ///
    /// Local backends judge future dates with `clock`, which should be the
    /// tracker's own clock. The HTTP backend leaves that rule to the server.
    pub fn build(&self, clock: Arc<dyn Clock>) -> SourceResult<Arc<dyn DateSource>> {
        let source: Arc<dyn DateSource> = match self.kind {
            SourceKind::Memory => Arc::new(MemorySource::new().with_clock(clock)),
            SourceKind::Sqlite => Arc::new(
                SqliteSource::open(expand_home(&self.database_path), &self.user_id)?
                    .with_clock(clock),
            ),
            SourceKind::Http => Arc::new(HttpSource::new(HttpSourceConfig {
                base_url: self.base_url.clone(),
                token: self.token.clone(),
                request_timeout_ms: self.request_timeout_secs * 1000,
            })?),
        };
        Ok(source)
    }
}

/// Resolve a leading `~/` against the home directory
fn expand_home(path: &str) -> PathBuf {
    match (path.strip_prefix("~/"), dirs::home_dir()) {
        (Some(rest), Some(home)) => home.join(rest),
        _ => PathBuf::from(path),
    }
}

/// Mutation engine configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TrackerConfig {
    #[serde(default)]
    pub mutation_policy: MutationPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "warn".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
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
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    ///
    /// Nothing is logged here: this usually runs before the subscriber
    /// exists, so the caller reports the returned [`ConfigSearch`].
    pub fn load_default() -> ConfigSearch {
        let config_paths: Vec<PathBuf> = [
            dirs::config_dir().map(|p| p.join("cycletrack").join("config.toml")),
            Some(PathBuf::from("/etc/cycletrack/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ]
        .into_iter()
        .flatten()
        .collect();

        Self::load_first(&config_paths)
    }

    /// Load the first existing file of `paths` that is valid
    pub fn load_first(paths: &[PathBuf]) -> ConfigSearch {
        let mut rejected = Vec::new();

        for path in paths.iter().filter(|p| p.exists()) {
            match Self::load_with_env(path) {
                Ok(config) => {
                    return ConfigSearch {
                        config,
                        loaded_from: Some(path.clone()),
                        rejected,
                    }
                }
                Err(e) => rejected.push((path.clone(), e)),
            }
        }

        ConfigSearch {
            config: Self::from_env(),
            loaded_from: None,
            rejected,
        }
    }

    /// Reject settings the analysis cannot work with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let cycle = &self.cycle;
        if cycle.min_cycle_days < 1 {
            return Err(ConfigError::Invalid(
                "cycle.min_cycle_days must be at least 1".to_string(),
            ));
        }
        if cycle.max_cycle_days < cycle.min_cycle_days {
            return Err(ConfigError::Invalid(
                "cycle.max_cycle_days must not be below cycle.min_cycle_days".to_string(),
            ));
        }
        Ok(())
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        // Source overrides
        if let Ok(kind) = std::env::var("CYCLETRACK_SOURCE") {
            match kind.parse() {
                Ok(kind) => self.source.kind = kind,
                Err(e) => tracing::warn!("Ignoring CYCLETRACK_SOURCE: {}", e),
            }
        }
        if let Ok(path) = std::env::var("CYCLETRACK_DATABASE") {
            self.source.database_path = path;
        }
        if let Ok(url) = std::env::var("CYCLETRACK_API_URL") {
            self.source.base_url = url;
        }
        if let Ok(token) = std::env::var("CYCLETRACK_API_TOKEN") {
            self.source.token = Some(token);
        }
        if let Ok(user) = std::env::var("CYCLETRACK_USER") {
            self.source.user_id = user;
        }

        // Logging overrides
        if let Ok(level) = std::env::var("CYCLETRACK_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("CYCLETRACK_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Result of searching the default config locations
#[derive(Debug)]
pub struct ConfigSearch {
    pub config: Config,
    /// File the config came from; `None` means defaults plus environment
    pub loaded_from: Option<PathBuf>,
    /// Existing files that could not be used, in search order
    pub rejected: Vec<(PathBuf, ConfigError)>,
}

impl ConfigSearch {
    /// Log where the config came from and every file that was skipped
    pub fn report(&self) {
        for (path, error) in &self.rejected {
            tracing::warn!("Failed to load config from {:?}: {}", path, error);
        }
        match &self.loaded_from {
            Some(path) => tracing::info!("Loaded config from {:?}", path),
            None => tracing::info!("Using default config with environment overrides"),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Cycletrack Configuration
#
# Environment variables override these settings:
# - CYCLETRACK_SOURCE
# - CYCLETRACK_DATABASE
# - CYCLETRACK_API_URL
# - CYCLETRACK_API_TOKEN
# - CYCLETRACK_USER
# - CYCLETRACK_LOG_LEVEL
# - CYCLETRACK_LOG_FORMAT

[source]
# Where recorded dates live: memory, sqlite or http
kind = "sqlite"

# SQLite database file (sqlite backend)
database_path = "~/.local/share/cycletrack/cycles.db"

# Subject whose dates are tracked (sqlite backend)
user_id = "default"

# Dates API base URL (http backend)
base_url = "http://localhost:3000"

# Bearer token for the dates API
# token = ""

# Request timeout in seconds
request_timeout_secs = 10

[cycle]
# Gaps shorter than this are ignored, and no two recorded dates may be closer
min_cycle_days = 15

# Gaps longer than this are ignored (usually a missed entry)
max_cycle_days = 45

# Number of future dates to predict
prediction_horizon = 6

[tracker]
# serialized: one change at a time (a failed change cannot discard another)
# concurrent: changes overlap
mutation_policy = "serialized"

[logging]
# Log level: trace, debug, info, warn, error
level = "warn"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
