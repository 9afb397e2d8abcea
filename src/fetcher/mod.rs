pub mod conditional;
pub mod http_fetcher;
pub mod parallel;

use std::fmt;

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use crate::app::Result;

/// Response body, yielded chunk by chunk as it arrives.
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

pub enum FetchResponse {
    /// New content (HTTP 200)
    Content {
        status: String,
        body: ByteStream,
        etag: Option<String>,
        last_modified: Option<String>,
    },
    /// Content not modified (HTTP 304)
    NotModified { status: String },
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Content {
                status,
                etag,
                last_modified,
                ..
            } => f
                .debug_struct("Content")
                .field("status", status)
                .field("etag", etag)
                .field("last_modified", last_modified)
                .finish_non_exhaustive(),
            Self::NotModified { status } => f
                .debug_struct("NotModified")
                .field("status", status)
                .finish(),
        }
    }
}

/// Issues one conditional GET. Implementations never retry.
#[async_trait]
pub trait Fetcher {
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResponse>;
}
