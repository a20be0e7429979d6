//! Download error types.
//!
//! These errors are designed to be serializable and not depend on external
//! error types like `std::io::Error` or `reqwest::Error`. Adapters capture the
//! kind and message as strings at the boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for the fetch/select/download/merge pipeline.
#[derive(Clone, Debug, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum DownloadError {
    /// Network or HTTP failure.
    #[error("Transport error: {message}")]
    Transport {
        /// Detailed error message.
        message: String,
        /// HTTP status code if the server answered.
        #[serde(skip_serializing_if = "Option::is_none")]
        status_code: Option<u16>,
        /// Whether retrying the same request may succeed.
        transient: bool,
    },

    /// No file name could be determined for a downloaded artifact.
    #[error("No file name could be determined for {url}")]
    Naming {
        /// The source URL of the artifact.
        url: String,
    },

    /// A named lock could not be acquired within the caller's timeout.
    #[error("Timed out after {timeout_ms} ms waiting for lock '{token}'")]
    LockTimeout {
        /// The lock token.
        token: String,
        /// The timeout that elapsed.
        timeout_ms: u64,
    },

    /// A named lock was released by a caller that does not own it.
    #[error("Lock ownership violation on '{token}': {message}")]
    Ownership {
        /// The lock token.
        token: String,
        /// What went wrong.
        message: String,
    },

    /// A persisted document could not be parsed.
    #[error("Failed to parse {path}: {message}")]
    Parse {
        /// Path of the document.
        path: String,
        /// Parser message.
        message: String,
    },

    /// I/O error during file operations.
    #[error("I/O error ({kind}): {message}")]
    Io {
        /// The kind of I/O error (e.g., "`NotFound`", "`PermissionDenied`").
        kind: String,
        /// Detailed error message.
        message: String,
    },

    /// General/uncategorized error.
    #[error("{message}")]
    Other {
        /// Error message.
        message: String,
    },
}

impl DownloadError {
    /// Create a transient transport error (network failure, 5xx, timeout).
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status_code: None,
            transient: true,
        }
    }

    /// Create a transport error from an HTTP status code.
    ///
    /// Server errors and 429 are considered transient, any other status is not.
    pub fn http_status(message: impl Into<String>, status_code: u16) -> Self {
        Self::Transport {
            message: message.into(),
            status_code: Some(status_code),
            transient: status_code >= 500 || status_code == 429,
        }
    }

    /// Create a transport error that must not be retried.
    pub fn transport_fatal(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            status_code: None,
            transient: false,
        }
    }

    /// Create a naming error.
    pub fn naming(url: impl Into<String>) -> Self {
        Self::Naming { url: url.into() }
    }

    /// Create a lock timeout error.
    pub fn lock_timeout(token: impl Into<String>, timeout: std::time::Duration) -> Self {
        Self::LockTimeout {
            token: token.into(),
            timeout_ms: u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Create an ownership error.
    pub fn ownership(token: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Ownership {
            token: token.into(),
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from kind and message strings.
    pub fn io(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Io {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Create an I/O error from a `std::io::Error`.
    #[must_use]
    pub fn from_io_error(err: &std::io::Error) -> Self {
        let kind = err.kind();
        Self::Io {
            kind: format!("{kind:?}"),
            message: err.to_string(),
        }
    }

    /// Create a generic error.
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Whether the failed operation may succeed if attempted again.
    ///
    /// Only transport errors flagged as transient qualify.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                transient: true,
                ..
            }
        )
    }

    /// HTTP status code, if this error came from an HTTP response.
    #[must_use]
    pub const fn status_code(&self) -> Option<u16> {
        match self {
            Self::Transport { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(err: std::io::Error) -> Self {
        Self::from_io_error(&err)
    }
}

/// Convenience result type for pipeline operations.
pub type DownloadResult<T> = Result<T, DownloadError>;
