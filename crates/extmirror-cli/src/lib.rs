//! Command-line interface for extmirror.
//!
//! The binary in `main.rs` is the composition root: it initialises logging,
//! loads `.env`, parses arguments and dispatches to [`handlers`].

#![deny(unused_crate_dependencies)]

pub mod commands;
pub mod error;
pub mod handlers;
pub mod parser;
pub mod presentation;

pub use commands::{Commands, DownloadCommand, InventoryCommand, Marketplace};
pub use error::CliError;
pub use parser::Cli;

// Used by the binary only
use anyhow as _;
use dotenvy as _;
use tracing_subscriber as _;

// Silence unused dev-dependency warnings
#[cfg(test)]
use async_trait as _;
#[cfg(test)]
use bytes as _;
#[cfg(test)]
use futures_util as _;
#[cfg(test)]
use serde_json as _;
#[cfg(test)]
use tokio_test as _;
