use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::{Client, StatusCode};

use crate::app::{Result, TributaryError};
use crate::fetcher::{FetchResponse, Fetcher};

pub const DEFAULT_USER_AGENT: &str = concat!("tributary/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        Self::with_settings(DEFAULT_USER_AGENT, DEFAULT_TIMEOUT)
    }

    pub fn with_settings(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

fn validator(header: &'static str, value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value).map_err(|_| TributaryError::InvalidValidator {
        header,
        value: value.to_string(),
    })
}

fn header_string(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(
        &self,
        url: &str,
        etag: Option<&str>,
        last_modified: Option<&str>,
    ) -> Result<FetchResponse> {
        let mut headers = HeaderMap::new();

        if let Some(etag) = etag {
            headers.insert(IF_NONE_MATCH, validator("If-None-Match", etag)?);
        }

        if let Some(last_modified) = last_modified {
            headers.insert(
                IF_MODIFIED_SINCE,
                validator("If-Modified-Since", last_modified)?,
            );
        }

        let response = self.client.get(url).headers(headers).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_MODIFIED {
            return Ok(FetchResponse::NotModified {
                status: "304 not modified".to_string(),
            });
        }

        if status != StatusCode::OK {
            return Err(TributaryError::UnexpectedStatus(status));
        }

        let etag = header_string(response.headers(), ETAG);
        let last_modified = header_string(response.headers(), LAST_MODIFIED);

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(TributaryError::from))
            .boxed();

        Ok(FetchResponse::Content {
            status: status.to_string(),
            body,
            etag,
            last_modified,
        })
    }
}
