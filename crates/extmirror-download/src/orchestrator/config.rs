//! Orchestrator configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use extmirror_core::{DownloadOptions, FilterOptions};

use crate::writer::{DEFAULT_READ_TIMEOUT, RetryPolicy};

/// Default number of simultaneous network operations.
pub const DEFAULT_CONCURRENCY: usize = 4;

/// Name of the temp directory created under the target when none is given.
pub const DEFAULT_TEMP_DIR_NAME: &str = ".temp";

/// Settings for one orchestrator run.
///
/// # Example
///
/// ```
/// use extmirror_download::OrchestratorConfig;
///
/// let config = OrchestratorConfig::new("./downloads/vscode").with_concurrency(8);
/// assert_eq!(config.temp_dir(), std::path::Path::new("./downloads/vscode/.temp"));
/// ```
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub(crate) target_dir: PathBuf,
    pub(crate) temp_dir: Option<PathBuf>,
    pub(crate) concurrency: usize,
    pub(crate) download_defaults: DownloadOptions,
    pub(crate) filter_defaults: FilterOptions,
    pub(crate) task_spec_out: Option<PathBuf>,
    pub(crate) lock_timeout: Option<Duration>,
    pub(crate) retry: RetryPolicy,
    pub(crate) read_timeout: Duration,
}

impl OrchestratorConfig {
    /// Configuration downloading into `target_dir` with default settings.
    pub fn new(target_dir: impl Into<PathBuf>) -> Self {
        Self {
            target_dir: target_dir.into(),
            temp_dir: None,
            concurrency: DEFAULT_CONCURRENCY,
            download_defaults: DownloadOptions::default(),
            filter_defaults: FilterOptions::default(),
            task_spec_out: None,
            lock_timeout: None,
            retry: RetryPolicy::default(),
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }

    /// Directory for in-progress downloads.
    ///
    /// Defaults to `{target_dir}/.temp`.
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Maximum simultaneous network operations (at least 1).
    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Options for queries that don't override them.
    #[must_use]
    pub const fn with_download_defaults(mut self, options: DownloadOptions) -> Self {
        self.download_defaults = options;
        self
    }

    /// Filters for queries that don't override them.
    #[must_use]
    pub fn with_filter_defaults(mut self, filters: FilterOptions) -> Self {
        self.filter_defaults = filters;
        self
    }

    /// Write the resolved task spec to `path` after the run.
    #[must_use]
    pub fn with_task_spec_out(mut self, path: impl Into<PathBuf>) -> Self {
        self.task_spec_out = Some(path.into());
        self
    }

    /// Bound how long a task waits for a sidecar lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = Some(timeout);
        self
    }

    #[must_use]
    pub const fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// How long an artifact body may stall before the attempt fails.
    #[must_use]
    pub const fn with_read_timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = timeout;
        self
    }

    #[must_use]
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    /// Effective temp directory.
    #[must_use]
    pub fn temp_dir(&self) -> PathBuf {
        self.temp_dir
            .clone()
            .unwrap_or_else(|| self.target_dir.join(DEFAULT_TEMP_DIR_NAME))
    }

    #[must_use]
    pub const fn concurrency(&self) -> usize {
        self.concurrency
    }

    #[must_use]
    pub const fn download_defaults(&self) -> DownloadOptions {
        self.download_defaults
    }

    #[must_use]
    pub const fn filter_defaults(&self) -> &FilterOptions {
        &self.filter_defaults
    }
}
