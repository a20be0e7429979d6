//! Public configuration for the plugin repository client.

use std::time::Duration;

/// Default JetBrains plugin repository.
pub const DEFAULT_REPOSITORY_URL: &str = "https://plugins.jetbrains.com";

/// Configuration for the plugin repository client.
///
/// # Example
///
/// ```
/// use extmirror_jetbrains::PluginRepositoryConfig;
///
/// let config = PluginRepositoryConfig::new()
///     .with_target_build("IC-241.15989.150")
///     .with_concurrency(2);
/// ```
#[derive(Debug, Clone)]
pub struct PluginRepositoryConfig {
    /// Repository root URL
    pub(crate) server_url: String,
    /// User agent string for HTTP requests
    pub(crate) user_agent: String,
    /// Per-request timeout
    pub(crate) timeout: Duration,
    /// Maximum number of retry attempts for transient errors
    pub(crate) max_retries: u8,
    /// Base delay for exponential backoff
    pub(crate) retry_base_delay: Duration,
    /// IDE build the plugins must be compatible with
    pub(crate) target_build: Option<String>,
    /// Maximum number of simultaneous list requests
    pub(crate) concurrency: usize,
}

impl Default for PluginRepositoryConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_REPOSITORY_URL.to_string(),
            user_agent: concat!("extmirror/", env!("CARGO_PKG_VERSION")).to_string(),
            timeout: Duration::from_secs(15),
            max_retries: 3,
            retry_base_delay: Duration::from_millis(500),
            target_build: None,
            concurrency: 4,
        }
    }
}

impl PluginRepositoryConfig {
    /// Create a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the repository root URL.
    #[must_use]
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
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

    /// Only return plugin versions that install on this IDE build
    /// (e.g. `IC-241.15989.150` or `241.15989`).
    #[must_use]
    pub fn with_target_build(mut self, build: impl Into<String>) -> Self {
        self.target_build = Some(build.into());
        self
    }

    /// Set how many plugins are looked up at once. Zero is treated as one.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }
}
