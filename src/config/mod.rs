//! Configuration management for scaffold-cache

pub mod schema;

pub use schema::Config;

use crate::cache::LockOptions;
use crate::error::{ScaffoldError, ScaffoldResult};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, info};

/// Environment variable overriding the cache TTL, in milliseconds
pub const TTL_ENV_VAR: &str = "SCAFFOLD_CACHE_TTL_MS";

/// TTL used when no valid override is present
pub const DEFAULT_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Resolve the cache TTL from a raw override value.
///
/// Only a non-negative integer count of milliseconds is accepted; anything
/// else silently falls back to [`DEFAULT_TTL`].
pub fn resolve_ttl(raw: Option<&str>) -> Duration {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(ms)) if ms >= 0 => Duration::from_millis(ms as u64),
        Some(_) => {
            debug!("Ignoring invalid {} override, using default TTL", TTL_ENV_VAR);
            DEFAULT_TTL
        }
        None => DEFAULT_TTL,
    }
}

/// Resolve the cache TTL from the process environment
pub fn ttl_from_env() -> Duration {
    resolve_ttl(std::env::var(TTL_ENV_VAR).ok().as_deref())
}

/// Runtime settings resolved once at process start
#[derive(Debug, Clone)]
pub struct Settings {
    /// Root directory holding every cached artifact
    pub cache_root: PathBuf,

    /// Maximum age of a fresh cache
    pub ttl: Duration,

    /// Cross-process lock tuning
    pub lock: LockOptions,

    /// Template archive location
    pub template_url: String,

    /// Per-request network timeout
    pub request_timeout: Duration,
}

impl Settings {
    /// Resolve settings from a loaded config plus the environment
    pub fn resolve(config: &Config) -> Self {
        let cache_root = config
            .cache
            .dir
            .clone()
            .unwrap_or_else(ConfigManager::default_cache_dir);
        // Document paths handed to callers must be absolute
        let cache_root = std::path::absolute(&cache_root).unwrap_or(cache_root);

        Self {
            cache_root,
            ttl: ttl_from_env(),
            lock: LockOptions {
                wait_budget: Duration::from_millis(config.cache.lock_wait_ms),
                poll_interval: Duration::from_millis(config.cache.lock_poll_ms),
                stale_after: Duration::from_millis(config.cache.lock_stale_ms),
            },
            template_url: config.sources.template_url.clone(),
            request_timeout: config.sources.request_timeout(),
        }
    }
}

/// Configuration manager
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new config manager with default path
    pub fn new() -> Self {
        Self {
            config_path: Self::default_config_path(),
        }
    }

    /// Create a config manager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scaffold-cache")
            .join("config.toml")
    }

    /// Get the default cache root
    pub fn default_cache_dir() -> PathBuf {
        dirs::cache_dir()
            .or_else(dirs::data_local_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join("scaffold-cache")
    }

    /// Load configuration, falling back to defaults if the file is missing
    pub async fn load(&self) -> ScaffoldResult<Config> {
        if !self.config_path.exists() {
            debug!("Config file not found, using defaults");
            return Ok(Config::default());
        }

        self.load_from_file(&self.config_path).await
    }

    /// Load configuration from a specific file
    pub async fn load_from_file(&self, path: &Path) -> ScaffoldResult<Config> {
        let content = fs::read_to_string(path).await.map_err(|e| {
            ScaffoldError::io(format!("reading config from {}", path.display()), e)
        })?;

        toml::from_str(&content).map_err(|e| ScaffoldError::ConfigInvalid {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Save configuration to file
    pub async fn save(&self, config: &Config) -> ScaffoldResult<()> {
        self.ensure_config_dir().await?;

        let content = toml::to_string_pretty(config)?;
        fs::write(&self.config_path, content).await.map_err(|e| {
            ScaffoldError::io(
                format!("writing config to {}", self.config_path.display()),
                e,
            )
        })?;

        info!("Configuration saved to {}", self.config_path.display());
        Ok(())
    }

    /// Ensure the config directory exists
    async fn ensure_config_dir(&self) -> ScaffoldResult<()> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ScaffoldError::ConfigDirCreate {
                    path: parent.to_path_buf(),
                    source: e,
                })?;
        }
        Ok(())
    }

    /// Get the config file path
    pub fn path(&self) -> &Path {
        &self.config_path
    }
}

impl Default for ConfigManager {
    fn default() -> Self {
        Self::new()
    }
}
