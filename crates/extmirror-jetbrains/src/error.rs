//! Internal error types for plugin repository operations.
//!
//! Mapped to [`DownloadError`] at the port boundary.

use extmirror_core::DownloadError;
use thiserror::Error;

/// Result type alias for repository operations.
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Errors related to plugin repository requests.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Request failed with an HTTP error status.
    #[error("Plugin repository request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The plugin list was not well-formed XML.
    #[error("Malformed plugin list: {0}")]
    Xml(#[from] roxmltree::Error),
}

impl From<RepositoryError> for DownloadError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::ApiRequestFailed { status, .. } => {
                Self::http_status(err.to_string(), status)
            }
            RepositoryError::Network(ref e) if e.is_builder() => {
                Self::transport_fatal(err.to_string())
            }
            RepositoryError::Network(_) => Self::transport(err.to_string()),
            RepositoryError::InvalidUrl(_) | RepositoryError::Xml(_) => {
                Self::transport_fatal(err.to_string())
            }
        }
    }
}
