//! HTTP backend abstraction for the plugin repository.
//!
//! The repository answers plain `GET` requests with an XML document. The
//! production backend uses reqwest with exponential backoff for server
//! errors and network failures; tests swap in [`testing::FakeBackend`].

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};
use url::Url;

use crate::config::PluginRepositoryConfig;
use crate::error::{RepositoryError, RepositoryResult};

// ============================================================================
// HTTP Backend Trait
// ============================================================================

/// Trait for HTTP backends that fetch a text document.
///
/// This is an implementation detail - external code should use the
/// `ExtensionSource` trait.
#[async_trait]
pub trait HttpBackend: Send + Sync {
    /// `GET` `url` and return the body as text.
    async fn get_text(&self, url: &Url) -> RepositoryResult<String>;
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
    pub fn new(config: &PluginRepositoryConfig) -> RepositoryResult<Self> {
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

    async fn get_with_retry(&self, url: &Url) -> RepositoryResult<reqwest::Response> {
        let mut last_error: Option<RepositoryError> = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.backoff(attempt);
                if let Some(ref err) = last_error {
                    warn!(attempt, ?delay, error = %err, "Retrying plugin list request");
                }
                tokio::time::sleep(delay).await;
            }

            match self.client.get(url.as_str()).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(response);
                    }

                    let err = RepositoryError::ApiRequestFailed {
                        status: status.as_u16(),
                        url: url.to_string(),
                    };
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

        Err(last_error.unwrap_or_else(|| RepositoryError::ApiRequestFailed {
            status: 0,
            url: url.to_string(),
        }))
    }
}

#[async_trait]
impl HttpBackend for ReqwestBackend {
    async fn get_text(&self, url: &Url) -> RepositoryResult<String> {
        let response = self.get_with_retry(url).await?;
        let text = response.text().await?;
        debug!(bytes = text.len(), "Plugin list received");
        Ok(text)
    }
}

// ============================================================================
// Fake Backend for Testing
// ============================================================================

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Canned reply for the fake backend.
    #[derive(Clone)]
    pub enum CannedResponse {
        /// A successful XML reply.
        Xml(String),
        /// An HTTP error status.
        Status(u16),
    }

    /// A fake backend that answers per `pluginId` query parameter and
    /// records every URL it is asked for.
    ///
    /// Plugins without a scripted reply get an empty repository document.
    #[derive(Default)]
    pub struct FakeBackend {
        replies: Mutex<HashMap<String, VecDeque<CannedResponse>>>,
        requests: Mutex<Vec<Url>>,
    }

    impl FakeBackend {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue a reply for the next list request about `plugin_id`.
        pub fn with_reply(self, plugin_id: &str, reply: CannedResponse) -> Self {
            self.replies
                .lock()
                .unwrap()
                .entry(plugin_id.to_string())
                .or_default()
                .push_back(reply);
            self
        }

        /// Every URL requested so far.
        pub fn requests(&self) -> Vec<Url> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl HttpBackend for FakeBackend {
        async fn get_text(&self, url: &Url) -> RepositoryResult<String> {
            self.requests.lock().unwrap().push(url.clone());

            let plugin_id = url
                .query_pairs()
                .find(|(k, _)| k == "pluginId")
                .map(|(_, v)| v.into_owned())
                .unwrap_or_default();
            let next = self
                .replies
                .lock()
                .unwrap()
                .get_mut(&plugin_id)
                .and_then(VecDeque::pop_front);

            match next {
                Some(CannedResponse::Xml(xml)) => Ok(xml),
                Some(CannedResponse::Status(status)) => Err(RepositoryError::ApiRequestFailed {
                    status,
                    url: url.to_string(),
                }),
                None => Ok("<plugin-repository/>".to_string()),
            }
        }
    }
}
