//! Endpoint configuration.
//!
//! The remote API location resolves from, in order: an explicit value,
//! the `CAREBOARD_API` environment variable, an optional TOML config file,
//! and finally the compiled default.

use std::path::Path;

use serde::Deserialize;

/// Base URL used when nothing else is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";

/// Environment variable overriding the base URL.
pub const ENV_BASE_URL: &str = "CAREBOARD_API";

/// Errors raised while reading a config file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// The config file is not valid TOML.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Resolved client configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Base URL of the occurrence API, without a trailing slash.
    pub base_url: String,
}

/// On-disk config file shape.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    api: Option<ApiSection>,
}

/// `[api]` section of the config file.
#[derive(Debug, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
}

impl ClientConfig {
    /// Creates a config pointing at the given base URL.
    ///
    /// Trailing slashes are trimmed so endpoint paths can be appended
    /// directly.
    #[must_use]
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Resolves the configuration from an explicit value, the environment,
    /// and an optional config file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a config file was given but cannot be
    /// read or parsed. A missing `[api]` section is not an error; the
    /// default applies.
    pub fn resolve(explicit: Option<&str>, path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::resolve_with(explicit, std::env::var(ENV_BASE_URL).ok(), path)
    }

    fn resolve_with(
        explicit: Option<&str>,
        env_value: Option<String>,
        path: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = explicit {
            return Ok(Self::new(url));
        }

        if let Some(url) = env_value
            && !url.is_empty()
        {
            return Ok(Self::new(&url));
        }

        if let Some(path) = path {
            let raw = std::fs::read_to_string(path)?;
            let file: ConfigFile = toml::from_str(&raw)?;
            if let Some(url) = file.api.and_then(|api| api.base_url) {
                return Ok(Self::new(&url));
            }
            log::warn!(
                "config file {} has no api.base_url, using {DEFAULT_BASE_URL}",
                path.display()
            );
        }

        Ok(Self::default())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}
