//! Internal error types for marketplace operations.
//!
//! These errors are internal to `extmirror-marketplace` and are mapped to
//! [`DownloadError`] at the port boundary.

use extmirror_core::DownloadError;
use thiserror::Error;

/// Result type alias for marketplace operations.
pub type MarketplaceResult<T> = Result<T, MarketplaceError>;

/// Errors related to marketplace API operations.
#[derive(Debug, Error)]
pub enum MarketplaceError {
    /// API request failed with an HTTP error status.
    #[error("Marketplace request failed with status {status}: {url}")]
    ApiRequestFailed {
        /// HTTP status code
        status: u16,
        /// The URL that was requested
        url: String,
    },

    /// API returned an invalid or unexpected response.
    #[error("Invalid response from marketplace: {message}")]
    InvalidResponse {
        /// Description of what was invalid
        message: String,
    },

    /// Network or HTTP client error.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl From<MarketplaceError> for DownloadError {
    fn from(err: MarketplaceError) -> Self {
        match err {
            MarketplaceError::ApiRequestFailed { status, .. } => {
                Self::http_status(err.to_string(), status)
            }
            MarketplaceError::Network(ref e) if e.is_builder() => {
                Self::transport_fatal(err.to_string())
            }
            MarketplaceError::Network(_) => Self::transport(err.to_string()),
            MarketplaceError::InvalidUrl(_)
            | MarketplaceError::InvalidResponse { .. }
            | MarketplaceError::JsonParse(_) => Self::transport_fatal(err.to_string()),
        }
    }
}
