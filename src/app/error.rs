use std::path::PathBuf;

use reqwest::StatusCode;
use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum TributaryError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unexpected status code: {0}")]
    UnexpectedStatus(StatusCode),

    #[error("Invalid {header} validator: {value:?}")]
    InvalidValidator { header: &'static str, value: String },

    #[error("Corrupt cache metadata at {path}: {source}")]
    CorruptMetadata {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Failed to read cache metadata at {path}: {source}")]
    MetadataRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to {action} {path}: {source}")]
    Storage {
        action: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Batch deadline exceeded")]
    DeadlineExceeded,

    #[error("Batch cancelled")]
    Cancelled,

    #[error("Worker aborted: {0}")]
    WorkerAborted(String),
}

/// Coarse classification used to tell a corrupt cache apart from a network
/// problem when reporting per-item failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Network,
    Storage,
    Metadata,
    Deadline,
    Cancelled,
    Internal,
}

impl TributaryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Config(_) => ErrorKind::Config,
            Self::Http(e) if e.is_timeout() => ErrorKind::Deadline,
            Self::Http(_) | Self::UnexpectedStatus(_) | Self::InvalidValidator { .. } => {
                ErrorKind::Network
            }
            Self::CorruptMetadata { .. } | Self::MetadataRead { .. } => ErrorKind::Metadata,
            Self::Storage { .. } | Self::Io(_) => ErrorKind::Storage,
            Self::DeadlineExceeded => ErrorKind::Deadline,
            Self::Cancelled => ErrorKind::Cancelled,
            Self::WorkerAborted(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn storage(
        action: &'static str,
        path: impl Into<PathBuf>,
    ) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| Self::Storage {
            action,
            path,
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, TributaryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_errors_are_distinct_from_network() {
        let err = TributaryError::CorruptMetadata {
            path: PathBuf::from("logo.svg.meta.json"),
            source: serde_json::from_str::<serde_json::Value>("{").unwrap_err(),
        };
        assert_eq!(err.kind(), ErrorKind::Metadata);
        assert_eq!(
            TributaryError::UnexpectedStatus(StatusCode::NOT_FOUND).kind(),
            ErrorKind::Network
        );
    }

    #[test]
    fn test_unexpected_status_message() {
        let err = TributaryError::UnexpectedStatus(StatusCode::NOT_FOUND);
        assert_eq!(err.to_string(), "Unexpected status code: 404 Not Found");
    }

    #[test]
    fn test_storage_error_mentions_path() {
        let make = TributaryError::storage("rename", "out/logo.svg");
        let err = make(std::io::Error::other("denied"));
        assert_eq!(err.kind(), ErrorKind::Storage);
        assert!(err.to_string().contains("rename out/logo.svg"));
    }

    #[test]
    fn test_deadline_and_cancel_kinds() {
        assert_eq!(TributaryError::DeadlineExceeded.kind(), ErrorKind::Deadline);
        assert_eq!(TributaryError::Cancelled.kind(), ErrorKind::Cancelled);
    }
}
