//! Sidecar cache metadata.
//!
//! Every published file `<dest>` gets a pretty-printed JSON record at
//! `<dest>.meta.json` holding the validators the server returned for it.
//! The record is read before each fetch and rewritten after every 200.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::app::{Result, TributaryError};
use crate::writer::AtomicWriter;

pub const SIDECAR_SUFFIX: &str = ".meta.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub source_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
}

impl CacheMetadata {
    /// True when there is at least one validator to send back.
    pub fn has_validators(&self) -> bool {
        self.etag.is_some() || self.last_modified.is_some()
    }
}

/// Storage for per-destination cache metadata.
#[async_trait]
pub trait MetadataStore {
    /// Load metadata for `destination`; a missing record yields the default.
    async fn load(&self, destination: &Path) -> Result<CacheMetadata>;
    async fn save(&self, destination: &Path, metadata: &CacheMetadata) -> Result<()>;
}

/// Keeps metadata in a JSON file next to each destination.
#[derive(Debug, Clone, Copy, Default)]
pub struct SidecarStore {
    writer: AtomicWriter,
}

impl SidecarStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sidecar_path(destination: &Path) -> PathBuf {
        let mut name = OsString::from(destination.as_os_str());
        name.push(SIDECAR_SUFFIX);
        PathBuf::from(name)
    }
}

#[async_trait]
impl MetadataStore for SidecarStore {
    async fn load(&self, destination: &Path) -> Result<CacheMetadata> {
        let path = Self::sidecar_path(destination);

        let content = match tokio::fs::read(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(CacheMetadata::default());
            }
            Err(source) => return Err(TributaryError::MetadataRead { path, source }),
        };

        serde_json::from_slice(&content)
            .map_err(|source| TributaryError::CorruptMetadata { path, source })
    }

    async fn save(&self, destination: &Path, metadata: &CacheMetadata) -> Result<()> {
        let path = Self::sidecar_path(destination);
        let mut content = serde_json::to_vec_pretty(metadata)
            .map_err(|e| TributaryError::storage("encode", &path)(e.into()))?;
        content.push(b'\n');

        self.writer.write_bytes(&path, content).await?;
        Ok(())
    }
}
