//! Core domain types and ports for extmirror.
//!
//! - `domain` - extension, version and sidecar records, options, precedence
//! - `error` - the pipeline error taxonomy
//! - `events` - progress events emitted by the orchestrator
//! - `ports` - traits implemented by marketplace and progress adapters

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;

// Re-export commonly used types for convenience
pub use domain::{
    DownloadOptions, DownloadedVersionRecord, EngineMatch, ExtensionIdentity, ExtensionQuery,
    ExtensionRecord, ExtensionSpec, FilterOptions, MetadataSidecar, TargetPlatform,
    UnknownPlatform, VersionKey, VersionRecord, compare_versions, engine_matches,
};
pub use error::{DownloadError, DownloadResult};
pub use events::DownloadEvent;
pub use ports::{
    DownloadEventEmitterPort, ExtensionSource, FileName, NoopDownloadEmitter, artifact_stem,
    full_extension,
};
