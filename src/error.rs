//! Error types for scaffold-cache
//!
//! All modules use `ScaffoldResult<T>` as their return type.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for scaffold-cache operations
pub type ScaffoldResult<T> = Result<T, ScaffoldError>;

/// All errors that can occur in scaffold-cache
#[derive(Error, Debug)]
pub enum ScaffoldError {
    // Network errors
    #[error("Request to {url} failed with HTTP status {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("Request to {url} failed: {reason}")]
    Transport { url: String, reason: String },

    // Archive errors
    #[error("Failed to extract template archive into {path}: {reason}")]
    Archive { path: PathBuf, reason: String },

    // Lock errors
    #[error("Timed out after {waited:?} waiting for cache lock {path}")]
    LockTimeout { path: PathBuf, waited: Duration },

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// A failure shared between coalesced callers of the same download
    #[error("{0}")]
    Coalesced(Arc<ScaffoldError>),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScaffoldError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a transport error for a URL
    pub fn transport(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Recover an owned error from one shared between coalesced callers.
    ///
    /// The last holder gets the original error back; everyone else gets a
    /// `Coalesced` wrapper that displays identically.
    pub fn from_shared(shared: Arc<ScaffoldError>) -> Self {
        match Arc::try_unwrap(shared) {
            Ok(err) => err,
            Err(shared) => Self::Coalesced(shared),
        }
    }

    /// The underlying error, looking through `Coalesced` wrappers
    pub fn root(&self) -> &ScaffoldError {
        match self {
            Self::Coalesced(inner) => inner.root(),
            other => other,
        }
    }

    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self.root() {
            Self::LockTimeout { .. } | Self::Transport { .. } => true,
            Self::HttpStatus { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self.root() {
            Self::LockTimeout { .. } => {
                Some("Another process is downloading; retry shortly or run: scaffold-cache clear")
            }
            Self::Transport { .. } => Some("Check your network connection and retry"),
            Self::HttpStatus { .. } => Some("Check [sources] template_url in your config"),
            Self::ConfigInvalid { .. } => {
                Some("Fix the file or move it aside; run: scaffold-cache config path")
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = ScaffoldError::HttpStatus {
            url: "https://example.com/t.zip".to_string(),
            status: 404,
        };
        assert!(err.to_string().contains("HTTP status 404"));
    }

    #[test]
    fn error_hint() {
        let err = ScaffoldError::transport("https://example.com", "connection refused");
        assert_eq!(err.hint(), Some("Check your network connection and retry"));
    }

    #[test]
    fn error_retryable() {
        let server = ScaffoldError::HttpStatus {
            url: String::new(),
            status: 503,
        };
        let missing = ScaffoldError::HttpStatus {
            url: String::new(),
            status: 404,
        };
        assert!(server.is_retryable());
        assert!(!missing.is_retryable());
    }

    #[test]
    fn shared_error_unwraps_when_unique() {
        let shared = Arc::new(ScaffoldError::Internal("boom".to_string()));
        let err = ScaffoldError::from_shared(shared);
        assert!(matches!(err, ScaffoldError::Internal(_)));
    }

    #[test]
    fn shared_error_wraps_when_still_held() {
        let shared = Arc::new(ScaffoldError::LockTimeout {
            path: PathBuf::from("/tmp/.download.lock"),
            waited: Duration::from_secs(6),
        });
        let _other = Arc::clone(&shared);
        let err = ScaffoldError::from_shared(shared);

        assert!(matches!(err, ScaffoldError::Coalesced(_)));
        assert!(err.to_string().contains("waiting for cache lock"));
        assert!(err.is_retryable());
    }
}
