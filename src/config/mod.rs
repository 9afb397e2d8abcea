//! Manifest loading for Tributary.
//!
//! A manifest is a TOML file listing the assets to mirror, the directory they
//! are mirrored into, and optional fetch tuning. Loading validates the whole
//! file up front so a bad manifest aborts before any request is made.

use std::collections::HashMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::domain::FetchItem;
use crate::fetcher::http_fetcher::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use crate::fetcher::parallel::{default_workers, DEFAULT_DEADLINE};

pub const DEFAULT_MANIFEST: &str = "tributary.toml";

/// Fetch tuning, all optional in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct FetchSettings {
    /// Number of concurrent workers (default: available CPUs)
    pub parallel: usize,

    /// Deadline for the whole batch in seconds (default: 60)
    pub deadline_secs: u64,

    /// Per-request timeout in seconds (default: 30)
    pub timeout_secs: u64,

    /// User-Agent sent with every request
    pub user_agent: String,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            parallel: default_workers(),
            deadline_secs: DEFAULT_DEADLINE.as_secs(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl FetchSettings {
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.deadline_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Manifest {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub fetch: FetchSettings,

    #[serde(default)]
    pub items: Vec<FetchItem>,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

impl Manifest {
    /// Read, parse and validate the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let manifest: Manifest = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })?;

        manifest.validate()?;
        Ok(manifest)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let manifest: Manifest = toml::from_str(content).map_err(ConfigError::ParseInline)?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.items.is_empty() {
            return Err(ConfigError::NoItems);
        }

        for (index, item) in self.items.iter().enumerate() {
            validate_item(index, item)?;
        }

        let settings = &self.fetch;
        if settings.parallel == 0 {
            return Err(ConfigError::Invalid("fetch.parallel must be at least 1".into()));
        }
        if settings.deadline_secs == 0 {
            return Err(ConfigError::Invalid("fetch.deadline_secs must be at least 1".into()));
        }
        if settings.timeout_secs == 0 {
            return Err(ConfigError::Invalid("fetch.timeout_secs must be at least 1".into()));
        }

        Ok(())
    }

    /// Destination paths that appear more than once, in first-seen order.
    pub fn duplicate_paths(&self) -> Vec<&str> {
        let mut seen: HashMap<&str, usize> = HashMap::new();
        let mut duplicates = Vec::new();

        for item in &self.items {
            let count = seen.entry(item.path.as_str()).or_insert(0);
            *count += 1;
            if *count == 2 {
                duplicates.push(item.path.as_str());
            }
        }

        duplicates
    }
}

fn validate_item(index: usize, item: &FetchItem) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidItem { index, reason };

    if item.path.trim().is_empty() {
        return Err(invalid("path is empty".into()));
    }

    let escapes_root = Path::new(&item.path)
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes_root {
        return Err(invalid(format!(
            "path {:?} must be relative and stay inside output_dir",
            item.path
        )));
    }

    let url = Url::parse(&item.url).map_err(|e| invalid(format!("url {:?}: {}", item.url, e)))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(invalid(format!(
            "url {:?} must use http or https",
            item.url
        )));
    }

    Ok(())
}

/// Configuration errors. All of them abort the batch before it starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read manifest at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse manifest at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to parse manifest: {0}")]
    ParseInline(toml::de::Error),

    #[error("Manifest lists no items")]
    NoItems,

    #[error("Item {index}: {reason}")]
    InvalidItem { index: usize, reason: String },

    #[error("{0}")]
    Invalid(String),
}
