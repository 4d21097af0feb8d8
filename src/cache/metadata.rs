//! Cache freshness record with TTL support

use crate::error::{ScaffoldError, ScaffoldResult};
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::debug;

/// Persisted metadata for the last successful download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    /// Milliseconds since the Unix epoch
    pub timestamp: i64,
}

impl CacheMetadata {
    /// Metadata stamped with the given instant
    pub fn at(instant: DateTime<Utc>) -> Self {
        Self {
            timestamp: instant.timestamp_millis(),
        }
    }

    /// The recorded instant, if representable
    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    /// Whether the record is still fresh at `now` under `ttl`
    pub fn is_fresh_at(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        let age_ms = i128::from(now.timestamp_millis()) - i128::from(self.timestamp);
        age_ms <= ttl.as_millis() as i128
    }
}

/// Reads and writes the metadata record under the cache root
#[derive(Debug, Clone)]
pub struct MetadataStore {
    root: PathBuf,
    path: PathBuf,
    ttl: Duration,
}

impl MetadataStore {
    pub fn new(root: impl Into<PathBuf>, path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            root: root.into(),
            path: path.into(),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record. Missing or malformed records read as `None`.
    pub async fn read(&self) -> Option<CacheMetadata> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                debug!("No cache metadata at {}: {}", self.path.display(), e);
                return None;
            }
        };

        match serde_json::from_str::<CacheMetadata>(&content) {
            Ok(meta) => Some(meta),
            Err(e) => {
                debug!("Ignoring malformed cache metadata: {}", e);
                None
            }
        }
    }

    /// Whether the cache is fresh right now
    pub async fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now()).await
    }

    /// Whether the cache is fresh at the given instant
    pub async fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        match self.read().await {
            Some(meta) => {
                let fresh = meta.is_fresh_at(now, self.ttl);
                debug!(
                    timestamp = meta.timestamp,
                    ttl_ms = self.ttl.as_millis() as u64,
                    fresh,
                    "Checked cache metadata"
                );
                fresh
            }
            None => false,
        }
    }

    /// When the cache was last refreshed, if known
    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.read().await.and_then(|meta| meta.refreshed_at())
    }

    /// Record a successful download as of now
    pub async fn mark_fresh(&self) -> ScaffoldResult<()> {
        self.write(&CacheMetadata::at(Utc::now())).await
    }

    /// Overwrite the record
    pub async fn write(&self, meta: &CacheMetadata) -> ScaffoldResult<()> {
        fs::create_dir_all(&self.root).await.map_err(|e| {
            ScaffoldError::io(format!("creating cache directory {}", self.root.display()), e)
        })?;

        let content = serde_json::to_string(meta)?;
        let tmp = self.path.with_extension(format!("json.{}.tmp", std::process::id()));

        fs::write(&tmp, content).await.map_err(|e| {
            ScaffoldError::io(format!("writing cache metadata {}", tmp.display()), e)
        })?;
        fs::rename(&tmp, &self.path).await.map_err(|e| {
            ScaffoldError::io(format!("replacing cache metadata {}", self.path.display()), e)
        })?;

        debug!("Cache metadata stamped at {}", meta.timestamp);
        Ok(())
    }

    /// Remove the record so the next check misses
    pub async fn invalidate(&self) -> ScaffoldResult<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ScaffoldError::io(
                format!("removing cache metadata {}", self.path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_store(ttl: Duration) -> (MetadataStore, TempDir) {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("cache");
        let store = MetadataStore::new(&root, root.join("metadata.json"), ttl);
        (store, temp)
    }

    #[tokio::test]
    async fn missing_metadata_is_invalid() {
        let (store, _temp) = test_store(Duration::from_secs(60));
        assert!(store.read().await.is_none());
        assert!(!store.is_valid().await);
    }

    #[tokio::test]
    async fn malformed_metadata_is_invalid() {
        let (store, _temp) = test_store(Duration::from_secs(60));
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();

        std::fs::write(store.path(), "not json").unwrap();
        assert!(!store.is_valid().await);

        std::fs::write(store.path(), r#"{"updated": 1}"#).unwrap();
        assert!(!store.is_valid().await);

        std::fs::write(store.path(), r#"{"timestamp": "yesterday"}"#).unwrap();
        assert!(!store.is_valid().await);
    }

    #[tokio::test]
    async fn mark_fresh_creates_root_and_validates() {
        let (store, _temp) = test_store(Duration::from_secs(60));

        store.mark_fresh().await.unwrap();

        assert!(store.path().exists());
        assert!(store.is_valid().await);
        let stamped = store.last_refreshed().await.unwrap();
        assert!((Utc::now() - stamped).num_seconds() < 5);
    }

    #[tokio::test]
    async fn expiry_follows_ttl_boundary() {
        let (store, _temp) = test_store(Duration::from_millis(1000));
        let now = Utc::now();

        store
            .write(&CacheMetadata::at(now - chrono::Duration::milliseconds(1000)))
            .await
            .unwrap();
        assert!(store.is_valid_at(now).await);

        store
            .write(&CacheMetadata::at(now - chrono::Duration::milliseconds(1001)))
            .await
            .unwrap();
        assert!(!store.is_valid_at(now).await);
    }

    #[tokio::test]
    async fn zero_ttl_only_accepts_same_instant() {
        let (store, _temp) = test_store(Duration::ZERO);
        let now = Utc::now();

        store.write(&CacheMetadata::at(now)).await.unwrap();
        assert!(store.is_valid_at(now).await);
        assert!(!store.is_valid_at(now + chrono::Duration::milliseconds(1)).await);
    }

    #[tokio::test]
    async fn write_replaces_previous_record() {
        let (store, _temp) = test_store(Duration::from_secs(60));

        store.write(&CacheMetadata { timestamp: 1 }).await.unwrap();
        store.write(&CacheMetadata { timestamp: 2 }).await.unwrap();

        assert_eq!(store.read().await, Some(CacheMetadata { timestamp: 2 }));
        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(raw, r#"{"timestamp":2}"#);
    }

    #[tokio::test]
    async fn invalidate_removes_record() {
        let (store, _temp) = test_store(Duration::from_secs(60));
        store.mark_fresh().await.unwrap();

        store.invalidate().await.unwrap();
        store.invalidate().await.unwrap();

        assert!(!store.is_valid().await);
    }
}
