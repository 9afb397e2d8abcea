use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{Result, TributaryError};
use crate::cache::{CacheMetadata, MetadataStore};
use crate::domain::{FetchItem, FetchOutcome};
use crate::fetcher::{FetchResponse, Fetcher};
use crate::writer::AtomicWriter;

/// Decides per item whether to re-download, and publishes fresh content
/// together with its cache metadata.
pub struct ConditionalFetcher {
    fetcher: Arc<dyn Fetcher + Send + Sync>,
    store: Arc<dyn MetadataStore + Send + Sync>,
    writer: AtomicWriter,
    output_dir: PathBuf,
}

impl ConditionalFetcher {
    pub fn new(
        fetcher: Arc<dyn Fetcher + Send + Sync>,
        store: Arc<dyn MetadataStore + Send + Sync>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            fetcher,
            store,
            writer: AtomicWriter::new(),
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fetch one item, attempting every step exactly once.
    pub async fn fetch(&self, item: &FetchItem) -> Result<FetchOutcome> {
        let destination = item.destination(&self.output_dir);
        let cached = self.store.load(&destination).await?;

        if cached.has_validators() {
            debug!(
                path = %item.path,
                etag = ?cached.etag,
                last_modified = ?cached.last_modified,
                "Sending conditional request"
            );
        }

        let response = self
            .fetcher
            .fetch(
                &item.url,
                cached.etag.as_deref(),
                cached.last_modified.as_deref(),
            )
            .await?;

        match response {
            FetchResponse::NotModified { status } => {
                debug!("{} not modified", item.path);
                Ok(FetchOutcome::NotModified { status })
            }
            FetchResponse::Content {
                status,
                body,
                etag,
                last_modified,
            } => {
                let written = self.writer.write(&destination, body).await?;
                info!("Updated {} ({} bytes)", item.path, written.size);

                let metadata = CacheMetadata {
                    etag,
                    last_modified,
                    source_url: item.url.clone(),
                    updated_at: Some(Utc::now()),
                    sha256: Some(written.sha256),
                    size: Some(written.size),
                };

                let warning = match self.store.save(&destination, &metadata).await {
                    Ok(()) => None,
                    Err(e) => {
                        warn!("Failed to save cache metadata for {}: {}", item.path, e);
                        Some(format!("cache metadata not saved: {}", e))
                    }
                };

                Ok(FetchOutcome::Replaced { status, warning })
            }
        }
    }

    /// Like [`fetch`](Self::fetch), but abandoned once `deadline` passes or
    /// `cancel` fires. Work that has not started yet fails immediately.
    ///
    /// The deadline can land after the new content was renamed into place but
    /// before its sidecar is saved. The item then reports `DeadlineExceeded`
    /// and `updated = false` although the destination already holds the new
    /// bytes. The sidecar still describes the old content (or is absent), so
    /// the next run requests the asset again and repairs the metadata.
    pub async fn fetch_until(
        &self,
        item: &FetchItem,
        deadline: Instant,
        cancel: &CancellationToken,
    ) -> Result<FetchOutcome> {
        if cancel.is_cancelled() {
            return Err(TributaryError::Cancelled);
        }
        if Instant::now() >= deadline {
            return Err(TributaryError::DeadlineExceeded);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TributaryError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => Err(TributaryError::DeadlineExceeded),
            outcome = self.fetch(item) => outcome,
        }
    }
}
