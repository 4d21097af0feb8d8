//! Cross-process advisory lock backed by a marker file
//!
//! A zero-byte marker file signals that some process is mutating the cache.
//! The marker's modification time doubles as a heartbeat: a marker older than
//! the staleness threshold is assumed to belong to a crashed holder and is
//! reclaimed.

use crate::error::{ScaffoldError, ScaffoldResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};
use tokio::fs;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Timing parameters for lock acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOptions {
    /// Total time to keep retrying before giving up
    pub wait_budget: Duration,

    /// Delay between attempts while the marker is held
    pub poll_interval: Duration,

    /// Marker age after which it is reclaimed
    pub stale_after: Duration,
}

impl Default for LockOptions {
    fn default() -> Self {
        Self {
            wait_budget: Duration::from_secs(6),
            poll_interval: Duration::from_millis(200),
            stale_after: Duration::from_secs(5 * 60),
        }
    }
}

/// Lock counters, shared by every acquisition through one [`CacheLock`]
#[derive(Debug, Default)]
pub struct LockMetrics {
    acquisitions: AtomicU64,
    releases: AtomicU64,
    contended: AtomicU64,
    stale_reclaimed: AtomicU64,
    timeouts: AtomicU64,
}

impl LockMetrics {
    pub fn snapshot(&self) -> LockStats {
        LockStats {
            acquisitions: self.acquisitions.load(Ordering::Relaxed),
            releases: self.releases.load(Ordering::Relaxed),
            contended: self.contended.load(Ordering::Relaxed),
            stale_reclaimed: self.stale_reclaimed.load(Ordering::Relaxed),
            timeouts: self.timeouts.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`LockMetrics`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LockStats {
    pub acquisitions: u64,
    pub releases: u64,
    pub contended: u64,
    pub stale_reclaimed: u64,
    pub timeouts: u64,
}

/// A marker-file lock at a fixed path
#[derive(Debug)]
pub struct CacheLock {
    path: PathBuf,
    options: LockOptions,
    metrics: LockMetrics,
}

impl CacheLock {
    pub fn new(path: impl Into<PathBuf>, options: LockOptions) -> Self {
        Self {
            path: path.into(),
            options,
            metrics: LockMetrics::default(),
        }
    }

    pub fn stats(&self) -> LockStats {
        self.metrics.snapshot()
    }

    /// Whether a live (non-stale) marker currently exists
    pub async fn is_held(&self) -> bool {
        match marker_age(&self.path).await {
            Ok(age) => age <= self.options.stale_after,
            Err(_) => false,
        }
    }

    /// Acquire the lock, waiting up to the configured budget.
    ///
    /// The returned guard must be released with [`LockGuard::release`]; if it
    /// is dropped instead, the marker is removed synchronously.
    pub async fn acquire(&self) -> ScaffoldResult<LockGuard<'_>> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                ScaffoldError::io(format!("creating lock directory {}", parent.display()), e)
            })?;
        }

        let started = Instant::now();
        let mut contended = false;

        loop {
            match create_marker(&self.path).await {
                Ok(()) => {
                    self.metrics.acquisitions.fetch_add(1, Ordering::Relaxed);
                    debug!(
                        waited_ms = started.elapsed().as_millis() as u64,
                        "Acquired cache lock {}",
                        self.path.display()
                    );
                    return Ok(LockGuard {
                        lock: self,
                        released: false,
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
                Err(e) => {
                    return Err(ScaffoldError::io(
                        format!("creating lock marker {}", self.path.display()),
                        e,
                    ))
                }
            }

            if !contended {
                contended = true;
                self.metrics.contended.fetch_add(1, Ordering::Relaxed);
            }

            match marker_age(&self.path).await {
                Ok(age) if age > self.options.stale_after => {
                    warn!(
                        age_secs = age.as_secs(),
                        "Reclaiming stale cache lock {}",
                        self.path.display()
                    );
                    match reclaim_stale(&self.path, self.options.stale_after).await {
                        Ok(true) => {
                            self.metrics.stale_reclaimed.fetch_add(1, Ordering::Relaxed);
                            continue;
                        }
                        Ok(false) => continue,
                        Err(e) => warn!("Failed to remove stale lock marker: {}", e),
                    }
                }
                // Holder released between our attempts
                Err(e) if e.kind() == ErrorKind::NotFound => continue,
                _ => {}
            }

            let waited = started.elapsed();
            if waited >= self.options.wait_budget {
                self.metrics.timeouts.fetch_add(1, Ordering::Relaxed);
                return Err(ScaffoldError::LockTimeout {
                    path: self.path.clone(),
                    waited,
                });
            }

            debug!("Cache lock busy, retrying in {:?}", self.options.poll_interval);
            tokio::time::sleep(self.options.poll_interval).await;
        }
    }
}

/// Scoped ownership of a [`CacheLock`]
#[derive(Debug)]
pub struct LockGuard<'a> {
    lock: &'a CacheLock,
    released: bool,
}

impl LockGuard<'_> {
    /// Remove the marker. Failures are logged, never returned.
    pub async fn release(mut self) {
        self.released = true;
        release_marker(&self.lock.path).await;
        self.lock.metrics.releases.fetch_add(1, Ordering::Relaxed);
    }
}

impl Drop for LockGuard<'_> {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        match std::fs::remove_file(&self.lock.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!(
                "Failed to release cache lock {}: {}",
                self.lock.path.display(),
                e
            ),
        }
        self.lock.metrics.releases.fetch_add(1, Ordering::Relaxed);
    }
}

/// Delete a lock marker, logging instead of failing
pub async fn release_marker(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Released cache lock {}", path.display()),
        Err(e) if e.kind() == ErrorKind::NotFound => {
            warn!("Cache lock {} was already gone on release", path.display())
        }
        Err(e) => warn!("Failed to release cache lock {}: {}", path.display(), e),
    }
}

async fn create_marker(path: &Path) -> std::io::Result<()> {
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map(|_| ())
}

/// Move a stale marker aside, then delete it if it is still stale.
///
/// Only one waiter can rename a given marker, so two waiters that both saw it
/// as stale cannot both remove it. A waiter that ends up holding a fresh
/// marker links it back. The marker can still be briefly absent while that
/// happens, so a third process may slip in during that window.
///
/// Returns `false` when another waiter got to the marker first.
async fn reclaim_stale(path: &Path, stale_after: Duration) -> std::io::Result<bool> {
    let aside = aside_path(path);
    match fs::rename(path, &aside).await {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }

    if marker_age(&aside).await? > stale_after {
        fs::remove_file(&aside).await?;
        return Ok(true);
    }

    debug!("Lock marker {} was renewed, restoring it", path.display());
    let restored = fs::hard_link(&aside, path).await;
    if let Err(e) = fs::remove_file(&aside).await {
        warn!("Failed to remove {}: {}", aside.display(), e);
    }
    match restored {
        Ok(()) => Ok(false),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

/// Unique sibling name for a marker being reclaimed
fn aside_path(path: &Path) -> PathBuf {
    static SEQ: AtomicU64 = AtomicU64::new(0);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "lock".to_string());
    path.with_file_name(format!(
        "{}.stale-{}-{}",
        name,
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ))
}

async fn marker_age(path: &Path) -> std::io::Result<Duration> {
    let modified = fs::metadata(path).await?.modified()?;
    // A marker from the future (clock skew) counts as brand new
    Ok(SystemTime::now()
        .duration_since(modified)
        .unwrap_or(Duration::ZERO))
}
