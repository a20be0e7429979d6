//! Domain types for extension mirroring.
//!
//! Everything here is plain data plus ordering rules; reading and writing
//! files or talking to marketplaces happens in adapter crates.

mod extension;
mod options;
mod platform;
mod version;

pub use extension::{
    DownloadedVersionRecord, ExtensionIdentity, ExtensionRecord, MetadataSidecar, VersionRecord,
};
pub use options::{DownloadOptions, ExtensionQuery, ExtensionSpec, FilterOptions};
pub use platform::{TargetPlatform, UnknownPlatform};
pub use version::{EngineMatch, VersionKey, compare_versions, engine_matches};
