//! Download event emitter port.

use crate::events::DownloadEvent;

/// Port for emitting download events.
///
/// Implementations must not block; the orchestrator calls `emit` from
/// inside download tasks.
pub trait DownloadEventEmitterPort: Send + Sync {
    /// Emit a download event.
    fn emit(&self, event: DownloadEvent);
}

/// A no-op download event emitter for tests and quiet contexts.
#[derive(Debug, Clone, Default)]
pub struct NoopDownloadEmitter;

impl NoopDownloadEmitter {
    /// Create a new no-op download emitter.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DownloadEventEmitterPort for NoopDownloadEmitter {
    fn emit(&self, _event: DownloadEvent) {}
}
