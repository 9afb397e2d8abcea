use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One asset to mirror: where it lands (relative to the output root) and
/// where it comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchItem {
    pub path: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl FetchItem {
    pub fn new(path: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            url: url.into(),
            license: None,
            notes: None,
        }
    }

    /// Final location of this item under `output_dir`.
    pub fn destination(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.path)
    }
}
