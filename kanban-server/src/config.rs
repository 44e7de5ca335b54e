//! Configuration system for the kanban server.
//!
//! Supports layered configuration with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attribute)
//! 3. TOML config file (`~/.config/kanban-server/config.toml`)
//! 4. Compiled defaults

use std::path::PathBuf;
use std::time::Duration;

/// Errors that can occur when loading server configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Failed to parse the TOML configuration.
    #[error("failed to parse config file: {0}")]
    ParseToml(#[from] toml::de::Error),
}

/// When the engine parks a moving task on a sentinel position.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SentinelPolicy {
    /// Only when the store enforces unique `(column, position)`.
    #[default]
    Auto,
    /// On every move.
    Always,
    /// Never.
    Never,
}

// ---------------------------------------------------------------------------
// TOML file structs (all fields Option for partial overrides)
// ---------------------------------------------------------------------------

/// Top-level TOML config file structure for the server.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerConfigFile {
    server: ServerFileConfig,
    store: StoreFileConfig,
    engine: EngineFileConfig,
}

/// `[server]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ServerFileConfig {
    bind_addr: Option<String>,
    log_file: Option<PathBuf>,
}

/// `[store]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct StoreFileConfig {
    enforce_unique_positions: Option<bool>,
}

/// `[engine]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct EngineFileConfig {
    lock_timeout_ms: Option<u64>,
    max_lock_attempts: Option<u32>,
    sentinel: Option<SentinelPolicy>,
}

// ---------------------------------------------------------------------------
// CLI arguments
// ---------------------------------------------------------------------------

/// CLI arguments for the server.
#[derive(clap::Parser, Debug, Default)]
#[command(version, about = "Kanban board server")]
pub struct ServerCliArgs {
    /// Address to bind the HTTP server to.
    #[arg(short, long, env = "KANBAN_ADDR")]
    pub bind: Option<String>,

    /// Path to config file (default: `~/.config/kanban-server/config.toml`).
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Enforce unique (column, position) pairs in the store.
    #[arg(long)]
    pub unique_positions: Option<bool>,

    /// Milliseconds to wait for column locks before reporting a conflict.
    #[arg(long)]
    pub lock_timeout_ms: Option<u64>,

    /// Sentinel position policy for moves.
    #[arg(long, value_enum)]
    pub sentinel: Option<SentinelPolicy>,

    /// Write logs to this file instead of stderr.
    #[arg(long, env = "KANBAN_LOG_FILE")]
    pub log_file: Option<PathBuf>,

    /// Log level filter (trace, debug, info, warn, error).
    #[arg(long, default_value = "info", env = "KANBAN_LOG")]
    pub log_level: String,
}

// ---------------------------------------------------------------------------
// Resolved configuration
// ---------------------------------------------------------------------------

/// Repositioning engine settings.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Upper bound on waiting for column locks.
    pub lock_timeout: Duration,
    /// How often a move re-locks when its task changes column concurrently.
    pub max_lock_attempts: u32,
    /// Sentinel position policy.
    pub sentinel: SentinelPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            max_lock_attempts: 3,
            sentinel: SentinelPolicy::Auto,
        }
    }
}

/// Fully resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to (e.g., `127.0.0.1:8080`).
    pub bind_addr: String,
    /// Whether the store enforces unique `(column, position)`.
    pub enforce_unique_positions: bool,
    /// Engine settings.
    pub engine: EngineConfig,
    /// Optional log file.
    pub log_file: Option<PathBuf>,
    /// Log level filter string.
    pub log_level: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            enforce_unique_positions: true,
            engine: EngineConfig::default(),
            log_file: None,
            log_level: "info".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration by merging CLI args, env vars, and a TOML file.
    ///
    /// If `--config` is given and the file does not exist, returns an error.
    /// If no `--config` is given, the default path is tried and missing file
    /// is treated as empty config.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit config file cannot be read
    /// or parsed.
    pub fn load(cli: &ServerCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Ok(Self::resolve(cli, &file))
    }

    /// Resolve a `ServerConfig` from CLI args and a parsed config file.
    ///
    /// Priority: CLI > file > default.
    #[must_use]
    fn resolve(cli: &ServerCliArgs, file: &ServerConfigFile) -> Self {
        let defaults = Self::default();

        Self {
            bind_addr: cli
                .bind
                .clone()
                .or_else(|| file.server.bind_addr.clone())
                .unwrap_or(defaults.bind_addr),
            enforce_unique_positions: cli
                .unique_positions
                .or(file.store.enforce_unique_positions)
                .unwrap_or(defaults.enforce_unique_positions),
            engine: EngineConfig {
                lock_timeout: cli
                    .lock_timeout_ms
                    .or(file.engine.lock_timeout_ms)
                    .map_or(defaults.engine.lock_timeout, Duration::from_millis),
                max_lock_attempts: file
                    .engine
                    .max_lock_attempts
                    .unwrap_or(defaults.engine.max_lock_attempts)
                    .max(1),
                sentinel: cli
                    .sentinel
                    .or(file.engine.sentinel)
                    .unwrap_or(defaults.engine.sentinel),
            },
            log_file: cli.log_file.clone().or_else(|| file.server.log_file.clone()),
            log_level: cli.log_level.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Load and parse a TOML config file for the server.
fn load_config_file(
    explicit_path: Option<&std::path::Path>,
) -> Result<ServerConfigFile, ConfigError> {
    let path = if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    } else {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(ServerConfigFile::default());
        };
        config_dir.join("kanban-server").join("config.toml")
    };

    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ServerConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
