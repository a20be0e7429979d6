//! Public configuration for the gallery client.

use std::time::Duration;

/// Default VS Code marketplace query endpoint.
pub const DEFAULT_GALLERY_URL: &str =
    "https://marketplace.visualstudio.com/_apis/public/gallery/extensionquery";

/// Configuration for the gallery client.
///
/// # Example
///
/// ```
/// use extmirror_marketplace::GalleryClientConfig;
/// use std::time::Duration;
///
/// let config = GalleryClientConfig::new()
///     .with_timeout(Duration::from_secs(30))
///     .with_max_retries(2);
/// ```
#[derive(Debug, Clone)]
pub struct GalleryClientConfig {
    /// Query endpoint
    pub(crate) query_url: String,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Per-request timeout
    pub(crate) timeout: Duration,
    /// Maximum number of retry attempts for transient errors
    pub(crate) max_retries: u8,
    /// Base delay for exponential backoff
    pub(crate) retry_base_delay: Duration,
}

impl Default for GalleryClientConfig {
    fn default() -> Self {
        Self {
            query_url: DEFAULT_GALLERY_URL.to_string(),
            user_agent: concat!("extmirror/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
        }
    }
}

impl GalleryClientConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the query endpoint.
    #[must_use]
    pub fn with_query_url(mut self, url: impl Into<String>) -> Self {
        self.query_url = url.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the request timeout.
    ///
    /// Defaults to 15 seconds.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the maximum number of retries for 5xx and network errors.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u8) -> Self {
        self.max_retries = max_retries;
        self
    }

    #[must_use]
    pub const fn with_retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }
}
