//! Network retrieval and local materialization of cached resources
//!
//! Two kinds of resources are fetched:
//!
//! - the template archive: required, any failure fails the whole batch
//! - API documents: independent, each failure is logged and the document
//!   is left out of the result

pub mod archive;
pub mod transport;

pub use transport::{Transport, UreqTransport};

use crate::cache::CacheLayout;
use crate::error::{ScaffoldError, ScaffoldResult};
use crate::resources::{DocumentEntry, DownloadResult, ResourceSpec};
use futures_util::future::join_all;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

/// Downloads resources into a cache layout
///
/// Callers must hold the cache lock while invoking any fetch method.
#[derive(Clone)]
pub struct ResourceFetcher {
    transport: Arc<dyn Transport>,
    layout: CacheLayout,
}

impl ResourceFetcher {
    pub fn new(transport: Arc<dyn Transport>, layout: CacheLayout) -> Self {
        Self { transport, layout }
    }

    /// Download the template archive and replace `web-template/` with its
    /// contents. Returns the template directory.
    pub async fn fetch_archive(&self, url: &str) -> ScaffoldResult<PathBuf> {
        let payload = self.transport.get(url).await?;
        debug!("Downloaded template archive ({} bytes)", payload.len());

        let root = self.layout.root().to_path_buf();
        fs::create_dir_all(&root).await.map_err(|e| {
            ScaffoldError::io(format!("creating cache directory {}", root.display()), e)
        })?;

        let live = self.layout.template_dir();
        let pid = std::process::id();
        let download = archive::sibling(&live, &format!("{}.zip.tmp", pid));
        let staging = archive::sibling(&live, &format!("staging-{}", pid));

        fs::write(&download, &payload).await.map_err(|e| {
            ScaffoldError::io(format!("writing archive {}", download.display()), e)
        })?;

        let outcome = {
            let (download, staging, live) = (download.clone(), staging.clone(), live.clone());
            tokio::task::spawn_blocking(move || -> ScaffoldResult<usize> {
                archive::remove_dir_if_exists(&staging)?;
                let files = archive::extract_zip(&download, &staging)?;
                archive::swap_into_place(&staging, &live)?;
                Ok(files)
            })
            .await
            .map_err(|e| ScaffoldError::Internal(format!("extraction task failed: {}", e)))
            .and_then(|result| result)
        };

        if let Err(e) = fs::remove_file(&download).await {
            warn!("Failed to remove {}: {}", download.display(), e);
        }

        match outcome {
            Ok(files) => {
                info!("Template extracted ({} files) to {}", files, live.display());
                Ok(live)
            }
            Err(e) => {
                if let Err(cleanup) = archive::remove_dir_if_exists(&staging) {
                    warn!("Failed to clean up staging directory: {}", cleanup);
                }
                Err(e)
            }
        }
    }

    /// Download every document concurrently.
    ///
    /// Never fails: documents that could not be fetched or written are
    /// logged and omitted. The result keeps the order of `specs`.
    pub async fn fetch_documents(&self, specs: &[ResourceSpec]) -> Vec<DocumentEntry> {
        let dir = self.layout.openapi_dir();
        if let Err(e) = fs::create_dir_all(&dir).await {
            warn!("Cannot create {}: {}", dir.display(), e);
            return Vec::new();
        }

        let attempts = specs.iter().map(|spec| async move {
            match self.fetch_document(spec).await {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(id = spec.id, "Skipping API document: {}", e);
                    None
                }
            }
        });

        let documents: Vec<_> = join_all(attempts).await.into_iter().flatten().collect();
        info!(
            "Fetched {}/{} API documents into {}",
            documents.len(),
            specs.len(),
            dir.display()
        );
        documents
    }

    async fn fetch_document(&self, spec: &ResourceSpec) -> ScaffoldResult<DocumentEntry> {
        let body = self.transport.get(spec.source_url).await?;

        let path = self.layout.openapi_dir().join(spec.file_name());
        let tmp = archive::sibling(&path, &format!("{}.tmp", std::process::id()));
        fs::write(&tmp, &body)
            .await
            .map_err(|e| ScaffoldError::io(format!("writing {}", tmp.display()), e))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| ScaffoldError::io(format!("replacing {}", path.display()), e))?;

        debug!(id = spec.id, "Saved API document to {}", path.display());
        Ok(DocumentEntry::new(spec, path))
    }

    /// Fetch the archive and all documents concurrently.
    ///
    /// Fails only when the archive fails.
    pub async fn fetch_batch(
        &self,
        template_url: &str,
        specs: &[ResourceSpec],
    ) -> ScaffoldResult<DownloadResult> {
        let (template, documents) =
            tokio::join!(self.fetch_archive(template_url), self.fetch_documents(specs));

        Ok(DownloadResult {
            template_dir: template?,
            documents,
        })
    }
}
