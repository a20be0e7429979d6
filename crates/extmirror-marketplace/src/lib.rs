//! VS Code marketplace adapter for extmirror.
//!
//! Implements [`extmirror_core::ExtensionSource`] on top of the gallery
//! `extensionquery` endpoint. Every requested identifier is looked up in a
//! single batched `POST`.
//!
//! ```ignore
//! use extmirror_marketplace::{DefaultGalleryClient, GalleryClientConfig};
//!
//! let client = DefaultGalleryClient::new(&GalleryClientConfig::default())?;
//! let records = client.fetch_extensions(&["rust-lang.rust-analyzer".into()]).await?;
//! ```

#![deny(unused_crate_dependencies)]

mod client;
mod config;
mod error;
mod http;
mod models;
mod parsing;

// ============================================================================
// Public API
// ============================================================================

pub use client::{DefaultGalleryClient, GalleryClient};
pub use config::{DEFAULT_GALLERY_URL, GalleryClientConfig};
pub use error::{MarketplaceError, MarketplaceResult};
pub use http::HttpBackend;

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
