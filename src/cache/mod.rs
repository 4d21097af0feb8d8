//! On-disk cache for downloaded scaffolding resources
//!
//! Everything lives under a single cache root:
//!
//! | Entry | Description |
//! |-------|-------------|
//! | `metadata.json` | Timestamp of the last fully successful download |
//! | `.download.lock` | Cross-process lock marker (zero bytes) |
//! | `web-template/` | Extracted template archive, replaced wholesale |
//! | `openapi/` | One file per fetched API document |
//!
//! Mutation only happens while the lock marker is held. Readers may check
//! freshness without the lock.

pub mod lock;
pub mod metadata;

pub use lock::{CacheLock, LockGuard, LockMetrics, LockOptions, LockStats};
pub use metadata::{CacheMetadata, MetadataStore};

use std::path::{Path, PathBuf};

/// Paths of the entries under a cache root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLayout {
    root: PathBuf,
}

impl CacheLayout {
    pub const METADATA_FILE: &'static str = "metadata.json";
    pub const LOCK_FILE: &'static str = ".download.lock";
    pub const TEMPLATE_DIR: &'static str = "web-template";
    pub const OPENAPI_DIR: &'static str = "openapi";

    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.root.join(Self::METADATA_FILE)
    }

    pub fn lock_path(&self) -> PathBuf {
        self.root.join(Self::LOCK_FILE)
    }

    pub fn template_dir(&self) -> PathBuf {
        self.root.join(Self::TEMPLATE_DIR)
    }

    pub fn openapi_dir(&self) -> PathBuf {
        self.root.join(Self::OPENAPI_DIR)
    }
}
