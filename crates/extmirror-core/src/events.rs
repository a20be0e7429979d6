//! Download pipeline events.
//!
//! Emitted by the orchestrator through [`DownloadEventEmitterPort`] so that
//! adapters (progress bars, logs) can follow a batch without the pipeline
//! knowing how they are displayed.
//!
//! [`DownloadEventEmitterPort`]: crate::ports::DownloadEventEmitterPort

use serde::{Deserialize, Serialize};

use crate::domain::TargetPlatform;

/// Events emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DownloadEvent {
    /// Extension records were fetched and `tasks` downloads were scheduled.
    BatchStarted { tasks: usize },
    /// A requested identifier was not returned by the marketplace.
    ExtensionMissing { ext_id: String },
    /// No version of an extension passed its filters.
    NoMatchingVersion { ext_id: String },
    /// A download task acquired its permit and started.
    TaskStarted {
        ext_id: String,
        version: String,
        platform: TargetPlatform,
    },
    /// A download task finished. `skipped` is set when an existing artifact
    /// was reused.
    TaskCompleted {
        ext_id: String,
        version: String,
        platform: TargetPlatform,
        file_name: String,
        skipped: bool,
    },
    /// A download task failed after exhausting retries.
    TaskFailed {
        ext_id: String,
        version: String,
        platform: TargetPlatform,
        error: String,
    },
    /// Every task has finished.
    BatchFinished { completed: usize, failed: usize },
}

impl DownloadEvent {
    /// Whether this event marks the end of a single task.
    #[must_use]
    pub const fn is_task_terminal(&self) -> bool {
        matches!(self, Self::TaskCompleted { .. } | Self::TaskFailed { .. })
    }
}
