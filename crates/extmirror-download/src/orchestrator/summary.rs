//! Batch results.

use std::path::PathBuf;

use serde::Serialize;

use extmirror_core::{DownloadError, TargetPlatform};

/// A version that was downloaded (or found already present) and recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletedDownload {
    pub ext_id: String,
    pub version: String,
    pub platform: TargetPlatform,
    pub path: PathBuf,
    pub skipped: bool,
}

/// A version whose task failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedDownload {
    pub ext_id: String,
    pub version: String,
    pub platform: TargetPlatform,
    pub error: DownloadError,
}

/// Outcome of [`Orchestrator::run`](super::Orchestrator::run).
///
/// Per-item problems end up here instead of failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub completed: Vec<CompletedDownload>,
    pub failed: Vec<FailedDownload>,
    /// Requested identifiers the marketplace did not return.
    pub missing: Vec<String>,
    /// Extensions with no version passing their filters.
    pub unmatched: Vec<String>,
}

impl BatchSummary {
    /// Whether every scheduled task succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Whether anything at all needs the user's attention.
    #[must_use]
    pub fn has_warnings(&self) -> bool {
        !self.missing.is_empty() || !self.unmatched.is_empty()
    }

    /// Number of newly downloaded artifacts.
    #[must_use]
    pub fn downloaded_count(&self) -> usize {
        self.completed.iter().filter(|c| !c.skipped).count()
    }

    pub(crate) fn sort(&mut self) {
        self.completed
            .sort_by(|a, b| (&a.ext_id, &a.version, a.platform).cmp(&(&b.ext_id, &b.version, b.platform)));
        self.failed
            .sort_by(|a, b| (&a.ext_id, &a.version, a.platform).cmp(&(&b.ext_id, &b.version, b.platform)));
    }
}
