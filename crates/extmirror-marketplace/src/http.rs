//! HTTP backend abstraction for the gallery API.
//!
//! The gallery is queried with a JSON `POST`. The production backend uses
//! reqwest with exponential backoff for server errors and network failures;
//! tests swap in [`testing::FakeBackend`].

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use url::Url;

use crate::config::GalleryClientConfig;
use crate::error::{MarketplaceError, MarketplaceResult};

/// Accept header the gallery needs to answer with the JSON query shape.
const GALLERY_ACCEPT: &str = "application/json;api-version=3.0-preview.1";

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that can post a JSON body and decode a JSON reply.
///
/// This is an implementation detail - external code should use the
/// `ExtensionSource` trait.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// Post `body` as JSON to `url` and deserialize the response.
    async fn post_json<B, T>(&self, url: &Url, body: &B) -> MarketplaceResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send;
}

// ============================================================================
// Reqwest Backend
// ============================================================================

/// Production HTTP backend using reqwest with retry logic.
pub struct ReqwestBackend {
    client: reqwest::Client,
    max_retries: u8,
    retry_base_delay: Duration,
}

impl ReqwestBackend {
    /// Create a new reqwest backend with the given configuration.
    pub fn new(config: &GalleryClientConfig) -> MarketplaceResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()?;

        Ok(Self {
            client,
            max_retries: config.max_retries,
            retry_base_delay: config.retry_base_delay,
        })
    }

    /// Delay before retry number `attempt` (1-based).
    fn backoff(&self, attempt: u8) -> Duration {
        self.retry_base_delay * 2u32.pow(u32::from(attempt) - 1)
    }

    /// Post with automatic retry for transient errors.
    async fn post_with_retry<B: Serialize + Sync>(
        &self,
        url: &Url,
        body: &B,
    ) -> MarketplaceResult<reqwest::Response> {
        let mut last_error: Option<MarketplaceError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                if let Some(ref err) = last_error {
                    warn!(attempt, ?delay, error = %err, "Retrying gallery query");
                }
                tokio::time::sleep(delay).await;
            }

            let request = self
                .client
                .post(url.as_str())
                .header(reqwest::header::ACCEPT, GALLERY_ACCEPT)
                .json(body);

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let err = MarketplaceError::ApiRequestFailed {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
                    // 5xx errors are retryable (server-side issues)
                    if status.is_server_error() && attempt < self.max_retries {
                        last_error = Some(err);
                        continue;
                    }
                    return Err(err);
                }
                Err(e) => {
                    if !e.is_builder() && attempt < self.max_retries {
                        last_error = Some(e.into());
                        continue;
                    }
                    return Err(e.into());
                }
            }
        }

        Err(last_error.unwrap_or_else(|| MarketplaceError::InvalidResponse {
            message: "Unknown error during query".to_string(),
        }))
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn post_json<B, T>(&self, url: &Url, body: &B) -> MarketplaceResult<T>
    where
        B: Serialize + Sync,
        T: DeserializeOwned + Send,
    {
        let response = self.post_with_retry(url, body).await?;
        let text = response.text().await?;
        debug!(bytes = text.len(), "Gallery response received");
        Ok(serde_json::from_str(&text)?)
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================
