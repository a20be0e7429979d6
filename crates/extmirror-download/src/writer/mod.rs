//! Atomic artifact writer.
//!
//! Streams an artifact into a temp file named after a hash of its URL,
//! makes it durable, then publishes it with a rename so the final path only
//! ever holds a complete file. Transient transport failures are retried with
//! incremental backoff.

mod retry;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use sha2::{Digest, Sha256};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use extmirror_core::{DownloadError, FileName};

use crate::transport::{ArtifactTransport, ByteStream};

pub use retry::RetryPolicy;

/// Default time to wait for response headers or the next body chunk.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Parameters for a single artifact write.
#[derive(Debug, Clone, Copy)]
pub struct WriteRequest<'a> {
    /// Source URL.
    pub url: &'a str,
    /// Directory the artifact is published into.
    pub target_dir: &'a Path,
    /// How the final file name is determined.
    pub file_name: &'a FileName,
    /// Directory for in-progress downloads.
    pub temp_dir: &'a Path,
    /// Return an existing final file instead of downloading again.
    pub skip_if_exists: bool,
}

/// Result of a successful write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    /// Final artifact path.
    pub path: PathBuf,
    /// Whether an existing file was reused instead of downloaded.
    pub skipped: bool,
}

impl WriteOutcome {
    /// The final file name.
    #[must_use]
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Downloads artifacts and publishes them atomically.
pub struct AtomicFileWriter {
    transport: Arc<dyn ArtifactTransport>,
    retry: RetryPolicy,
    read_timeout: Duration,
}

impl AtomicFileWriter {
    /// Create a writer with the default retry policy and read timeout.
    pub fn new(transport: Arc<dyn ArtifactTransport>) -> Self {
        Self {
            transport,
            retry: RetryPolicy::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Override the retry policy.
    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Override how long opening the response or a body read may stall.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    /// Download `request.url` and publish it into `request.target_dir`.
    ///
    /// Creates both directories if needed. With `skip_if_exists` and a
    /// literal file name, an existing final file is returned without any
    /// network call; with a resolver the response is opened to learn the
    /// name but no bytes are written when the file already exists.
    pub async fn write(&self, request: &WriteRequest<'_>) -> Result<WriteOutcome, DownloadError> {
        fs::create_dir_all(request.target_dir).await?;
        fs::create_dir_all(request.temp_dir).await?;

        if request.skip_if_exists {
            if let Some(name) = request.file_name.known() {
                let path = request.target_dir.join(name);
                if is_file(&path).await {
                    debug!(path = %path.display(), "Artifact already present, skipping download");
                    return Ok(WriteOutcome {
                        path,
                        skipped: true,
                    });
                }
            }
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.attempt(request).await {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_transient() && self.retry.should_retry(attempt) => {
                    let delay = self.retry.delay_after(attempt);
                    warn!(
                        url = %request.url,
                        attempt,
                        delay_secs = delay.as_secs(),
                        error = %e,
                        "Transient download failure, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn attempt(&self, request: &WriteRequest<'_>) -> Result<WriteOutcome, DownloadError> {
        let response = tokio::time::timeout(self.read_timeout, self.transport.open(request.url))
            .await
            .map_err(|_| {
                DownloadError::transport(format!(
                    "no response from {} within {}s",
                    request.url,
                    self.read_timeout.as_secs()
                ))
            })??;

        let name = request
            .file_name
            .resolve(response.suggested_name.as_deref())
            .filter(|n| is_plain_file_name(n))
            .ok_or_else(|| DownloadError::naming(request.url))?;
        let final_path = request.target_dir.join(&name);

        if request.skip_if_exists && is_file(&final_path).await {
            debug!(path = %final_path.display(), "Artifact already present, skipping body");
            return Ok(WriteOutcome {
                path: final_path,
                skipped: true,
            });
        }

        let temp_path = request.temp_dir.join(temp_file_name(request.url));
        if let Err(e) = self.stream_to_file(&temp_path, response.body).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(e);
        }
        publish(&temp_path, &final_path).await?;

        debug!(path = %final_path.display(), "Artifact published");
        Ok(WriteOutcome {
            path: final_path,
            skipped: false,
        })
    }

    async fn stream_to_file(&self, path: &Path, mut body: ByteStream) -> Result<(), DownloadError> {
        let mut file = fs::File::create(path).await?;
        loop {
            let next = tokio::time::timeout(self.read_timeout, body.next())
                .await
                .map_err(|_| {
                    DownloadError::transport(format!(
                        "no data received for {}s",
                        self.read_timeout.as_secs()
                    ))
                })?;
            match next {
                Some(Ok(chunk)) => file.write_all(&chunk).await?,
                Some(Err(e)) => return Err(e),
                None => break,
            }
        }
        file.flush().await?;
        file.sync_all().await?;
        Ok(())
    }
}

/// Deterministic temp file name for a URL.
pub fn temp_file_name(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// Move `temp` to `target` without exposing a partial file at `target`.
///
/// A plain rename is atomic on one filesystem. When the temp directory lives
/// elsewhere the file is first copied next to the target and then renamed.
async fn publish(temp: &Path, target: &Path) -> Result<(), DownloadError> {
    if fs::rename(temp, target).await.is_ok() {
        return Ok(());
    }

    let staging = target.with_file_name(format!(
        ".{}.partial",
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));
    fs::copy(temp, &staging).await?;
    fs::File::open(&staging).await?.sync_all().await?;
    if let Err(e) = fs::rename(&staging, target).await {
        let _ = fs::remove_file(&staging).await;
        return Err(e.into());
    }
    let _ = fs::remove_file(temp).await;
    Ok(())
}

async fn is_file(path: &Path) -> bool {
    fs::metadata(path).await.is_ok_and(|m| m.is_file())
}

fn is_plain_file_name(name: &str) -> bool {
    name != "." && name != ".." && !name.contains(['/', '\\'])
}
