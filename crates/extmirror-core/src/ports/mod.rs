//! Port definitions (trait abstractions).
//!
//! Ports are the seams between the pipeline and the outside world: the
//! marketplace that supplies extension records and whoever listens to
//! progress events.

mod download_event_emitter;
mod extension_source;
mod naming;

pub use download_event_emitter::{DownloadEventEmitterPort, NoopDownloadEmitter};
pub use extension_source::ExtensionSource;
pub use naming::{FileName, artifact_stem, full_extension};
