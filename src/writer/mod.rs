//! Atomic publication of downloaded content.
//!
//! Bytes are streamed into `<final>.tmp` in the same directory as the final
//! path, flushed to disk, then renamed over the final path. Readers of the
//! final path see either the previous file or the new one, never a prefix.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;

use crate::app::{Result, TributaryError};

/// What was published by a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub size: u64,
    /// Hex-encoded SHA-256 of the published bytes
    pub sha256: String,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AtomicWriter;

impl AtomicWriter {
    pub fn new() -> Self {
        Self
    }

    /// Staging path used while `final_path` is being written.
    pub fn temp_path(final_path: &Path) -> PathBuf {
        let mut name = OsString::from(final_path.as_os_str());
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Stream `body` to `final_path`, publishing only once every chunk has
    /// been written and synced.
    pub async fn write<S>(&self, final_path: &Path, mut body: S) -> Result<WriteSummary>
    where
        S: Stream<Item = Result<Bytes>> + Unpin,
    {
        if let Some(parent) = final_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)
                    .await
                    .map_err(TributaryError::storage("create directory", parent))?;
            }
        }

        let tmp_path = Self::temp_path(final_path);
        let mut staged = StagedFile::new(tmp_path.clone());

        let mut file = fs::File::create(&tmp_path)
            .await
            .map_err(TributaryError::storage("create temp file", &tmp_path))?;

        let mut hasher = Sha256::new();
        let mut size = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            hasher.update(&chunk);
            size += chunk.len() as u64;
            file.write_all(&chunk)
                .await
                .map_err(TributaryError::storage("write temp file", &tmp_path))?;
        }

        file.flush()
            .await
            .map_err(TributaryError::storage("flush temp file", &tmp_path))?;
        file.sync_all()
            .await
            .map_err(TributaryError::storage("sync temp file", &tmp_path))?;
        drop(file);

        fs::rename(&tmp_path, final_path)
            .await
            .map_err(TributaryError::storage("rename temp file onto", final_path))?;
        staged.published();

        Ok(WriteSummary {
            size,
            sha256: hex::encode(hasher.finalize()),
        })
    }

    /// Publish an in-memory buffer through the same temp-then-rename path.
    pub async fn write_bytes(&self, final_path: &Path, bytes: Vec<u8>) -> Result<WriteSummary> {
        let body = futures::stream::iter([Ok(Bytes::from(bytes))]);
        self.write(final_path, body).await
    }
}

/// Removes the staging file unless it was renamed into place. Covers both
/// write errors and futures dropped mid-write by batch cancellation.
struct StagedFile {
    path: PathBuf,
    published: bool,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self {
            path,
            published: false,
        }
    }

    fn published(&mut self) {
        self.published = true;
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.published {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}
