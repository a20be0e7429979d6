//! Artifact transport abstraction.
//!
//! The writer only needs "open this URL, tell me what the server wants the
//! file called, and give me the bytes". This trait keeps the HTTP client out
//! of the write/retry logic and lets tests substitute scripted transports.

use std::sync::LazyLock;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use regex::Regex;
use reqwest::header::{CONTENT_DISPOSITION, HeaderMap};
use url::Url;

use extmirror_core::DownloadError;

/// Stream of body chunks.
pub type ByteStream = BoxStream<'static, Result<Bytes, DownloadError>>;

/// An opened artifact download.
pub struct ArtifactResponse {
    /// File name suggested by the server, if any.
    pub suggested_name: Option<String>,
    /// Response body.
    pub body: ByteStream,
}

impl std::fmt::Debug for ArtifactResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactResponse")
            .field("suggested_name", &self.suggested_name)
            .finish_non_exhaustive()
    }
}

/// Something that can open artifact URLs.
#[async_trait]
pub trait ArtifactTransport: Send + Sync {
    /// Start a GET for `url`, following redirects.
    ///
    /// Errors must be classified: transient ones (network, timeouts, 5xx)
    /// are retried by the writer, anything else is not.
    async fn open(&self, url: &str) -> Result<ArtifactResponse, DownloadError>;
}

static QUOTED_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"filename="([^"]+)""#).expect("valid regex"));
static BARE_FILENAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"filename=([^;\s]+)").expect("valid regex"));

/// File name from a `Content-Disposition` header value.
pub fn content_disposition_file_name(value: &str) -> Option<String> {
    QUOTED_FILENAME
        .captures(value)
        .or_else(|| BARE_FILENAME.captures(value))
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|n| !n.is_empty())
}

/// Last path segment of a URL, unless the path ends with `/`.
pub fn url_file_name(url: &Url) -> Option<String> {
    if url.path().ends_with('/') {
        return None;
    }
    url.path_segments()
        .and_then(|mut segments| segments.next_back())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
}

fn suggested_name(headers: &HeaderMap, final_url: &Url) -> Option<String> {
    headers
        .get(CONTENT_DISPOSITION)
        .and_then(|v| v.to_str().ok())
        .and_then(content_disposition_file_name)
        .or_else(|| url_file_name(final_url))
}

/// Production transport backed by reqwest.
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport whose connection attempts time out after `timeout`.
    ///
    /// Waiting for headers and body reads are bounded by the writer's idle
    /// timeout, so a large artifact is not cut off by a total-request
    /// deadline.
    pub fn new(timeout: Duration) -> Result<Self, DownloadError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .user_agent(concat!("extmirror/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DownloadError::other(format!("failed to create HTTP client: {e}")))?;
        Ok(Self { client })
    }

    /// Wrap an existing client.
    #[must_use]
    pub const fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

/// Map a reqwest error onto the pipeline taxonomy.
fn classify(err: &reqwest::Error) -> DownloadError {
    if let Some(status) = err.status() {
        return DownloadError::http_status(err.to_string(), status.as_u16());
    }
    if err.is_builder() || err.is_redirect() {
        return DownloadError::transport_fatal(err.to_string());
    }
    DownloadError::transport(err.to_string())
}

#[async_trait]
impl ArtifactTransport for ReqwestTransport {
    async fn open(&self, url: &str) -> Result<ArtifactResponse, DownloadError> {
        let response = self.client.get(url).send().await.map_err(|e| classify(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::http_status(
                format!("GET {url} returned {status}"),
                status.as_u16(),
            ));
        }

        let suggested_name = suggested_name(response.headers(), response.url());
        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| classify(&e)))
            .boxed();

        Ok(ArtifactResponse {
            suggested_name,
            body,
        })
    }
}
