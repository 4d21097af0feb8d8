//! Download coordination
//!
//! Decides whether the network needs to be touched at all and makes sure that
//! it is touched at most once at a time:
//!
//! 1. Fast path: fresh metadata plus the expected directories on disk means
//!    the cached files are returned without taking any lock.
//! 2. Single-flight: within a process, every caller arriving while a download
//!    is outstanding awaits that same download.
//! 3. Cross-process lock: the download itself runs under the cache lock, and
//!    the cache is checked again once the lock is held since another process
//!    may have finished a download in the meantime.
//!
//! Metadata is only stamped after the template archive was installed.

use crate::cache::{CacheLayout, CacheLock, LockStats, MetadataStore};
use crate::config::Settings;
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::fetch::{ResourceFetcher, Transport, UreqTransport};
use crate::prompt::{self, EMBEDDED_PROMPT};
use crate::resources::{collect_cached, DocumentEntry, DownloadResult, ResourceSpec, OPENAPI_SPECS};
use chrono::{DateTime, Utc};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::fs;
use tracing::{debug, info, warn};

type SharedDownload = Shared<BoxFuture<'static, Result<DownloadResult, Arc<ScaffoldError>>>>;

/// Snapshot of the cache for display
#[derive(Debug, Clone, Serialize)]
pub struct CacheStatus {
    pub root: PathBuf,
    pub ttl_ms: u64,
    pub valid: bool,
    pub last_refreshed: Option<DateTime<Utc>>,
    pub template_present: bool,
    pub documents: Vec<DocumentEntry>,
    pub lock_held: bool,
}

/// Entry point for consumers of the cached resources
#[derive(Clone)]
pub struct DownloadCoordinator {
    inner: Arc<Inner>,
}

struct Inner {
    layout: CacheLayout,
    metadata: MetadataStore,
    lock: CacheLock,
    fetcher: ResourceFetcher,
    template_url: String,
    specs: &'static [ResourceSpec],
    in_flight: Mutex<Option<SharedDownload>>,
    fetch_cycles: AtomicU64,
}

impl DownloadCoordinator {
    /// Coordinator using the network and the built-in document table
    pub fn new(settings: &Settings) -> Self {
        let transport = Arc::new(UreqTransport::new(settings.request_timeout));
        Self::with_transport(settings, transport, OPENAPI_SPECS)
    }

    pub fn with_transport(
        settings: &Settings,
        transport: Arc<dyn Transport>,
        specs: &'static [ResourceSpec],
    ) -> Self {
        let layout = CacheLayout::new(&settings.cache_root);
        let inner = Inner {
            metadata: MetadataStore::new(layout.root(), layout.metadata_path(), settings.ttl),
            lock: CacheLock::new(layout.lock_path(), settings.lock),
            fetcher: ResourceFetcher::new(transport, layout.clone()),
            layout,
            template_url: settings.template_url.clone(),
            specs,
            in_flight: Mutex::new(None),
            fetch_cycles: AtomicU64::new(0),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    pub fn layout(&self) -> &CacheLayout {
        &self.inner.layout
    }

    pub fn lock_stats(&self) -> LockStats {
        self.inner.lock.stats()
    }

    /// Number of full fetch batches started by this coordinator
    pub fn fetch_cycles(&self) -> u64 {
        self.inner.fetch_cycles.load(Ordering::Relaxed)
    }

    /// Return the template directory and API documents, downloading them if
    /// the cache is stale.
    ///
    /// Documents that failed to download are missing from the result; only a
    /// template failure or a lock timeout is an error.
    pub async fn ensure_resources(&self) -> ScaffoldResult<DownloadResult> {
        if let Some(result) = self.inner.cached_result().await {
            debug!("Cache hit, serving {} document(s)", result.documents.len());
            return Ok(result);
        }

        let download = {
            let mut slot = lock_slot(&self.inner.in_flight);
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Joining download already in flight");
                    pending.clone()
                }
                None => {
                    let inner = Arc::clone(&self.inner);
                    // Runs to completion even if every caller goes away, so
                    // the lock marker and the slot are always cleaned up.
                    let task = tokio::spawn(async move {
                        let _reset = InFlightReset(&inner.in_flight);
                        inner.download_exclusive().await.map_err(Arc::new)
                    });
                    let download = task
                        .map(|joined| match joined {
                            Ok(outcome) => outcome,
                            Err(e) => Err(Arc::new(ScaffoldError::Internal(format!(
                                "download task failed: {}",
                                e
                            )))),
                        })
                        .boxed()
                        .shared();
                    *slot = Some(download.clone());
                    download
                }
            }
        };

        download.await.map_err(ScaffoldError::from_shared)
    }

    /// Prompt text from the template, or the embedded default if the template
    /// cannot be obtained. Never fails.
    pub async fn prompt_text(&self) -> String {
        match self.inner.prompt_from_template().await {
            Ok(text) => text,
            Err(e) => {
                warn!("Serving embedded prompt: {}", e);
                EMBEDDED_PROMPT.to_string()
            }
        }
    }

    pub async fn status(&self) -> CacheStatus {
        let inner = &self.inner;
        CacheStatus {
            root: inner.layout.root().to_path_buf(),
            ttl_ms: inner.metadata.ttl().as_millis() as u64,
            valid: inner.metadata.is_valid().await,
            last_refreshed: inner.metadata.last_refreshed().await,
            template_present: is_dir(&inner.layout.template_dir()).await,
            documents: collect_cached(&inner.layout.openapi_dir(), inner.specs).await,
            lock_held: inner.lock.is_held().await,
        }
    }

    /// Remove every cached artifact
    pub async fn clear(&self) -> ScaffoldResult<()> {
        let inner = &self.inner;
        let guard = inner.lock.acquire().await?;

        let outcome = inner.remove_all().await;
        guard.release().await;
        if outcome.is_ok() {
            info!("Cleared cache at {}", inner.layout.root().display());
        }
        outcome
    }
}

impl Inner {
    /// Result assembled from disk, if the cache is fresh and intact
    async fn cached_result(&self) -> Option<DownloadResult> {
        if !self.metadata.is_valid().await {
            return None;
        }

        let template_dir = self.layout.template_dir();
        if !is_dir(&template_dir).await {
            debug!("Metadata is fresh but {} is missing", template_dir.display());
            return None;
        }

        let openapi_dir = self.layout.openapi_dir();
        if !has_entries(&openapi_dir).await {
            debug!("Metadata is fresh but {} is empty", openapi_dir.display());
            return None;
        }

        Some(DownloadResult {
            template_dir,
            documents: collect_cached(&openapi_dir, self.specs).await,
        })
    }

    async fn download_exclusive(&self) -> ScaffoldResult<DownloadResult> {
        let guard = self.lock.acquire().await?;
        let outcome = self.download_under_lock().await;
        guard.release().await;
        outcome
    }

    async fn download_under_lock(&self) -> ScaffoldResult<DownloadResult> {
        if let Some(result) = self.cached_result().await {
            debug!("Cache was refreshed while waiting for the lock");
            return Ok(result);
        }

        self.fetch_cycles.fetch_add(1, Ordering::Relaxed);
        let result = self
            .fetcher
            .fetch_batch(&self.template_url, self.specs)
            .await?;

        // The files are in place even if stamping fails; the next call
        // simply downloads again.
        if let Err(e) = self.metadata.mark_fresh().await {
            warn!("Failed to record cache metadata: {}", e);
        }

        info!(
            "Downloaded template and {}/{} API documents",
            result.documents.len(),
            self.specs.len()
        );
        Ok(result)
    }

    async fn remove_all(&self) -> ScaffoldResult<()> {
        self.metadata.invalidate().await?;
        remove_tree(&self.layout.template_dir()).await?;
        remove_tree(&self.layout.openapi_dir()).await
    }

    async fn prompt_from_template(&self) -> ScaffoldResult<String> {
        let template_dir = self.template_for_prompt().await?;
        prompt::read_prompt(&template_dir).await
    }

    /// Template directory, fetching only the archive when needed
    async fn template_for_prompt(&self) -> ScaffoldResult<PathBuf> {
        let template_dir = self.layout.template_dir();
        if self.template_is_fresh(&template_dir).await {
            return Ok(template_dir);
        }

        let pending = lock_slot(&self.in_flight).clone();
        if let Some(download) = pending {
            match download.await {
                Ok(result) => return Ok(result.template_dir),
                Err(e) => debug!("In-flight download failed ({}), fetching template alone", e),
            }
        }

        let guard = self.lock.acquire().await?;
        let outcome = if self.template_is_fresh(&template_dir).await {
            Ok(template_dir)
        } else {
            self.fetcher.fetch_archive(&self.template_url).await
        };
        guard.release().await;
        outcome
    }

    async fn template_is_fresh(&self, template_dir: &Path) -> bool {
        self.metadata.is_valid().await && is_dir(template_dir).await
    }
}

/// Clears the in-flight handle when the download finishes, however it ends
struct InFlightReset<'a>(&'a Mutex<Option<SharedDownload>>);

impl Drop for InFlightReset<'_> {
    fn drop(&mut self) {
        *lock_slot(self.0) = None;
    }
}

fn lock_slot(slot: &Mutex<Option<SharedDownload>>) -> MutexGuard<'_, Option<SharedDownload>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn is_dir(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_dir())
}

async fn has_entries(dir: &Path) -> bool {
    match fs::read_dir(dir).await {
        Ok(mut entries) => matches!(entries.next_entry().await, Ok(Some(_))),
        Err(_) => false,
    }
}

async fn remove_tree(path: &Path) -> ScaffoldResult<()> {
    match fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ScaffoldError::io(format!("removing {}", path.display()), e)),
    }
}
