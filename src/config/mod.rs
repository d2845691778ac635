//! Configuration management for wallabag-sync.
//!
//! Values are read from `~/.config/wallabag-sync/config.toml` when that file
//! exists, then overridden by environment variables (`FEED_URL`,
//! `WALLABAG_BASE_URL`, `WALLABAG_CLIENT_ID`, `WALLABAG_CLIENT_SECRET`,
//! `WALLABAG_USERNAME`, `WALLABAG_PASSWORD`). Variables missing from the
//! process environment are looked up in a `.env` file in the working
//! directory. A missing default config file is fine: most deployments
//! configure the tool through the environment only. A file named with
//! `--config` must exist.

use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_PAGE_SIZE: u32 = 500;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DOTENV_FILE: &str = ".env";

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feed_url: String,
    pub wallabag: WallabagConfig,
    pub sync: SyncConfig,
}

/// Account and endpoint of the Wallabag instance.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct WallabagConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for WallabagConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WallabagConfig")
            .field("base_url", &self.base_url)
            .field("client_id", &self.client_id)
            .field("client_secret", &mask(&self.client_secret))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

/// Tuning knobs for a single run.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Maximum number of add/archive calls in flight
    pub workers: usize,
    /// `perPage` used when listing unread entries
    pub page_size: u32,
    /// Per-request timeout
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            page_size: DEFAULT_PAGE_SIZE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from `path` (or the default path), the process
    /// environment and `.env`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match Self::resolve_path(path) {
            Some(p) => Self::from_file(&p)?,
            None => Self::default(),
        };

        let dotenv = read_dotenv(Path::new(DOTENV_FILE))?;
        config.apply_env(layered(|key| std::env::var(key).ok(), &dotenv));
        Ok(config)
    }

    /// The file [`Config::load`] reads: an explicit path as given, otherwise
    /// the default path if it exists.
    pub fn resolve_path(path: Option<&Path>) -> Option<PathBuf> {
        match path {
            Some(p) => Some(p.to_path_buf()),
            None => Self::default_config_path().ok().filter(|p| p.exists()),
        }
    }

    /// Parse a TOML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path: `~/.config/wallabag-sync/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("wallabag-sync").join("config.toml"))
    }

    /// Override file values with whatever `lookup` returns for the known
    /// environment variables.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let slots = [
            ("FEED_URL", &mut self.feed_url),
            ("WALLABAG_BASE_URL", &mut self.wallabag.base_url),
            ("WALLABAG_CLIENT_ID", &mut self.wallabag.client_id),
            ("WALLABAG_CLIENT_SECRET", &mut self.wallabag.client_secret),
            ("WALLABAG_USERNAME", &mut self.wallabag.username),
            ("WALLABAG_PASSWORD", &mut self.wallabag.password),
        ];

        for (key, slot) in slots {
            if let Some(value) = lookup(key) {
                *slot = value;
            }
        }
    }

    /// Fail fast on empty required values and malformed URLs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("FEED_URL", &self.feed_url),
            ("WALLABAG_BASE_URL", &self.wallabag.base_url),
            ("WALLABAG_CLIENT_ID", &self.wallabag.client_id),
            ("WALLABAG_CLIENT_SECRET", &self.wallabag.client_secret),
            ("WALLABAG_USERNAME", &self.wallabag.username),
            ("WALLABAG_PASSWORD", &self.wallabag.password),
        ];

        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Missing(name));
            }
        }

        parse_http_url("FEED_URL", &self.feed_url)?;
        parse_http_url("WALLABAG_BASE_URL", &self.wallabag.base_url)?;

        if self.sync.workers == 0 {
            return Err(ConfigError::Invalid {
                name: "workers",
                reason: "must be at least 1".into(),
            });
        }
        if self.sync.page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "page_size",
                reason: "must be at least 1".into(),
            });
        }
        if self.sync.timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "timeout_secs",
                reason: "must be at least 1".into(),
            });
        }

        Ok(())
    }

    /// Human-readable dump with secrets masked.
    pub fn describe(&self) -> String {
        format!(
            "feed_url = {}\n\
             wallabag.base_url = {}\n\
             wallabag.client_id = {}\n\
             wallabag.client_secret = {}\n\
             wallabag.username = {}\n\
             wallabag.password = {}\n\
             sync.workers = {}\n\
             sync.page_size = {}\n\
             sync.timeout_secs = {}",
            self.feed_url,
            self.wallabag.base_url,
            self.wallabag.client_id,
            mask(&self.wallabag.client_secret),
            self.wallabag.username,
            mask(&self.wallabag.password),
            self.sync.workers,
            self.sync.page_size,
            self.sync.timeout_secs,
        )
    }
}

/// Parse an absolute http(s) URL.
pub fn parse_http_url(name: &'static str, value: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::InvalidUrl {
        name,
        value: value.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::InvalidUrl {
            name,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", other),
        }),
    }
}

/// Read `KEY=value` pairs from a dotenv file without touching the process
/// environment. A missing file yields no values.
pub fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let dotenv_error = |source| ConfigError::Dotenv {
        path: path.to_path_buf(),
        source,
    };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(dotenv_error(e)),
    };

    let mut values = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(dotenv_error)?;
        values.insert(key, value);
    }
    tracing::debug!(path = %path.display(), count = values.len(), "Loaded dotenv file");
    Ok(values)
}

/// Lookup that prefers `primary` and falls back to the dotenv values.
pub fn layered<'a, F>(
    primary: F,
    fallback: &'a HashMap<String, String>,
) -> impl Fn(&str) -> Option<String> + 'a
where
    F: Fn(&str) -> Option<String> + 'a,
{
    move |key| primary(key).or_else(|| fallback.get(key).cloned())
}

fn mask(secret: &str) -> &'static str {
    if secret.is_empty() {
        "<unset>"
    } else {
        "********"
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to read dotenv file at {path}: {source}")]
    Dotenv {
        path: PathBuf,
        source: dotenvy::Error,
    },

    #[error("Missing required configuration value: {0}")]
    Missing(&'static str),

    #[error("Invalid URL in {name} ({value}): {reason}")]
    InvalidUrl {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}
