//! JetBrains plugin repository adapter for extmirror.
//!
//! Implements [`extmirror_core::ExtensionSource`] on top of the repository's
//! `plugins/list` endpoint. Artifacts are named after the response, since
//! plugins ship either as `.zip` or `.jar`.
//!
//! ```ignore
//! use extmirror_jetbrains::{DefaultPluginRepositoryClient, PluginRepositoryConfig};
//!
//! let config = PluginRepositoryConfig::new().with_target_build("IC-241.15989.150");
//! let client = DefaultPluginRepositoryClient::new(&config)?;
//! let records = client.fetch_extensions(&["IdeaVIM".into()]).await?;
//! ```

#![deny(unused_crate_dependencies)]

mod build;
mod client;
mod config;
mod error;
mod http;
mod models;
mod naming;
mod parsing;

// ============================================================================
// Public API
// ============================================================================

pub use build::{BuildNumber, is_compatible};
pub use client::{DefaultPluginRepositoryClient, PluginRepositoryClient};
pub use config::{DEFAULT_REPOSITORY_URL, PluginRepositoryConfig};
pub use error::{RepositoryError, RepositoryResult};
pub use http::HttpBackend;
pub use naming::plugin_file_name;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
