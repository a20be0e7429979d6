//! CLI-specific error types and exit codes.

use extmirror_core::DownloadError;
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Pipeline error that stopped the whole command.
    #[error("{0}")]
    Download(#[from] DownloadError),

    /// Argument error.
    #[error("Invalid arguments: {0}")]
    Arguments(String),

    /// The batch ran but some downloads failed.
    #[error("{failed} download(s) failed")]
    PartialFailure {
        /// Number of failed tasks
        failed: usize,
    },

    /// The inventory found stale or unrecorded artifacts.
    #[error("Download directory is inconsistent")]
    Inconsistent,
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 2: Misuse of shell command (invalid arguments)
    /// - 64-78: Reserved for specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::PartialFailure { .. } | Self::Inconsistent => 1,
            Self::Arguments(_) => 2, // EX_USAGE
            Self::Download(err) => match err {
                DownloadError::Transport { .. } => 69, // EX_UNAVAILABLE
                DownloadError::Io { .. } => 74,        // EX_IOERR
                DownloadError::Parse { .. } => 65,     // EX_DATAERR
                _ => 1,
            },
        }
    }
}
