use std::ops::Index;

use crate::app::{Result, TributaryError};
use crate::domain::{FetchItem, ItemState};

/// Successful outcome of a single conditional fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Validators matched; nothing was written.
    NotModified { status: String },
    /// Fresh content was published to the destination.
    Replaced {
        status: String,
        /// Set when the content landed but its sidecar could not be saved.
        warning: Option<String>,
    },
}

/// Result for one input item, stored at the item's original index.
#[derive(Debug)]
pub struct FetchResult {
    pub index: usize,
    pub path: String,
    pub updated: bool,
    pub status: String,
    pub error: Option<TributaryError>,
    pub warning: Option<String>,
}

impl FetchResult {
    pub fn from_outcome(index: usize, item: &FetchItem, outcome: Result<FetchOutcome>) -> Self {
        let mut result = Self {
            index,
            path: item.path.clone(),
            updated: false,
            status: String::new(),
            error: None,
            warning: None,
        };

        match outcome {
            Ok(FetchOutcome::NotModified { status }) => {
                result.status = status;
            }
            Ok(FetchOutcome::Replaced { status, warning }) => {
                result.updated = true;
                result.status = status;
                result.warning = warning;
            }
            Err(e) => {
                result.error = Some(e);
            }
        }

        result
    }

    pub fn failed(index: usize, item: &FetchItem, error: TributaryError) -> Self {
        Self::from_outcome(index, item, Err(error))
    }

    pub fn state(&self) -> ItemState {
        if self.error.is_some() {
            ItemState::Failed
        } else if self.updated {
            ItemState::Replaced
        } else {
            ItemState::NotModified
        }
    }

    pub fn is_failure(&self) -> bool {
        self.error.is_some()
    }
}

/// Ordered results of one batch; `results[i]` always belongs to input item `i`.
#[derive(Debug, Default)]
pub struct BatchResult {
    results: Vec<FetchResult>,
}

impl BatchResult {
    pub fn new(results: Vec<FetchResult>) -> Self {
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FetchResult> {
        self.results.iter()
    }

    pub fn updated_count(&self) -> usize {
        self.results.iter().filter(|r| r.updated).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.results.iter().any(FetchResult::is_failure)
    }
}

impl Index<usize> for BatchResult {
    type Output = FetchResult;

    fn index(&self, index: usize) -> &Self::Output {
        &self.results[index]
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a FetchResult;
    type IntoIter = std::slice::Iter<'a, FetchResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
