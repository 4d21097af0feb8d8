//! Configuration schema for scaffold-cache
//!
//! Configuration is stored at `~/.config/scaffold-cache/config.toml`

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Default location of the project template archive
pub const DEFAULT_TEMPLATE_URL: &str =
    "https://github.com/scaffold-dev/web-template/archive/refs/heads/main.zip";

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache location and lock tuning
    pub cache: CacheConfig,

    /// Remote sources
    pub sources: SourcesConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
        }
    }
}

/// Cache configuration
///
/// The TTL is intentionally absent here; it is controlled only through
/// the `SCAFFOLD_CACHE_TTL_MS` environment variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache root directory (defaults to the platform cache dir)
    pub dir: Option<PathBuf>,

    /// Total time to wait for the cross-process lock
    pub lock_wait_ms: u64,

    /// Delay between lock attempts
    pub lock_poll_ms: u64,

    /// Age after which a lock marker is considered abandoned
    pub lock_stale_ms: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            lock_wait_ms: 6_000,
            lock_poll_ms: 200,
            lock_stale_ms: 5 * 60 * 1000,
        }
    }
}

/// Remote source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// Zip archive containing the project template
    pub template_url: String,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl SourcesConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            template_url: DEFAULT_TEMPLATE_URL.to_string(),
            request_timeout_secs: 30,
        }
    }
}
