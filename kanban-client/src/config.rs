//! Configuration for the board client.
//!
//! Read from a TOML file (`~/.config/kanban-client/config.toml` unless a
//! path is given) with compiled defaults for anything missing. A missing
//! default file is not an error; a missing explicit path is.

use std::path::{Path, PathBuf};
use std::time::Duration;

use url::Url;

/// Errors that can occur when loading client configuration.
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

    /// `server_url` is not a valid absolute URL.
    #[error("invalid server url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// `[client]` section of the config file.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ClientFileConfig {
    server_url: Option<String>,
    request_timeout_ms: Option<u64>,
}

/// Top-level TOML config file structure for the client.
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct ClientConfigFile {
    client: ClientFileConfig,
}

/// Resolved client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the kanban server.
    pub server_url: Url,
    /// Per-request timeout.
    pub request_timeout: Duration,
}

impl ClientConfig {
    /// Default server address.
    pub const DEFAULT_SERVER_URL: &'static str = "http://127.0.0.1:8080/";

    /// Settings pointing at `server_url` with the default timeout.
    #[must_use]
    pub fn for_server(server_url: Url) -> Self {
        Self {
            server_url,
            request_timeout: Duration::from_secs(10),
        }
    }

    /// Loads settings from `path`, or from the default location when `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if an explicit file cannot be read, a file
    /// cannot be parsed, or the configured URL is invalid.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = load_config_file(path)?;
        Self::resolve(&file)
    }

    fn resolve(file: &ClientConfigFile) -> Result<Self, ConfigError> {
        let server_url = Url::parse(
            file.client
                .server_url
                .as_deref()
                .unwrap_or(Self::DEFAULT_SERVER_URL),
        )?;
        let mut config = Self::for_server(server_url);
        if let Some(ms) = file.client.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

fn load_config_file(explicit_path: Option<&Path>) -> Result<ClientConfigFile, ConfigError> {
    if let Some(p) = explicit_path {
        let contents = std::fs::read_to_string(p).map_err(|e| ConfigError::ReadFile {
            path: p.to_path_buf(),
            source: e,
        })?;
        return Ok(toml::from_str(&contents)?);
    }

    let Some(config_dir) = dirs::config_dir() else {
        return Ok(ClientConfigFile::default());
    };
    let path = config_dir.join("kanban-client").join("config.toml");
    match std::fs::read_to_string(&path) {
        Ok(contents) => Ok(toml::from_str(&contents)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ClientConfigFile::default()),
        Err(e) => Err(ConfigError::ReadFile { path, source: e }),
    }
}
