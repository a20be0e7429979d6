//! Subcommand definitions.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use extmirror_core::{DownloadOptions, FilterOptions, TargetPlatform};
use extmirror_download::DEFAULT_CONCURRENCY;

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download extensions and record them in per-extension sidecars
    Download(DownloadCommand),
    /// Report what a download directory contains
    Inventory(InventoryCommand),
}

/// Marketplace a batch is fetched from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Marketplace {
    /// VS Code marketplace gallery
    #[default]
    Vscode,
    /// JetBrains plugin repository
    Jetbrains,
}

#[derive(Debug, Args)]
pub struct DownloadCommand {
    /// Extension identifiers (`publisher.name`, or plugin ids for JetBrains)
    #[arg(value_name = "IDS")]
    pub ids: Vec<String>,

    /// Marketplace to download from
    #[arg(long, value_enum, env = "EXTMIRROR_MARKETPLACE", default_value_t = Marketplace::Vscode)]
    pub marketplace: Marketplace,

    /// JetBrains only: IDE build plugins must be compatible with (e.g. IC-241.15989.150)
    #[arg(long = "target-build", env = "EXTMIRROR_TARGET_BUILD")]
    pub target_build: Option<String>,

    /// Task-spec JSON file with more identifiers or per-extension overrides
    #[arg(long = "from", value_name = "FILE")]
    pub from: Option<PathBuf>,

    /// Directory artifacts are downloaded into
    #[arg(long = "target-dir", env = "EXTMIRROR_TARGET_DIR")]
    pub target_dir: PathBuf,

    /// Scratch directory for in-flight downloads [default: TARGET_DIR/.temp]
    #[arg(long = "temp-dir", env = "EXTMIRROR_TEMP_DIR")]
    pub temp_dir: Option<PathBuf>,

    /// Maximum number of simultaneous downloads
    #[arg(long, env = "EXTMIRROR_CONCURRENCY", default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Write the fully resolved task spec to this file
    #[arg(long = "task-spec-out", value_name = "FILE")]
    pub task_spec_out: Option<PathBuf>,

    /// Only download builds for these platforms (repeatable)
    #[arg(long = "platform", value_name = "PLATFORM")]
    pub platforms: Vec<TargetPlatform>,

    /// Platform to fall back to when no requested platform matches
    #[arg(long = "platform-fallback", value_name = "PLATFORM")]
    pub platform_fallback: Option<TargetPlatform>,

    /// Only download versions compatible with this editor version
    #[arg(long = "engine-version", env = "EXTMIRROR_ENGINE_VERSION")]
    pub engine_version: Option<String>,

    /// Consider pre-release versions
    #[arg(long = "pre-release")]
    pub pre_release: bool,

    /// Reuse artifacts that already exist on disk
    #[arg(long = "skip-existing")]
    pub skip_existing: bool,

    /// Do not write metadata sidecars, and remove existing ones
    #[arg(long = "no-metadata")]
    pub no_metadata: bool,

    /// Put every extension's artifacts into the target directory itself
    #[arg(long)]
    pub flatten: bool,

    /// Delete artifacts of superseded versions after a download
    #[arg(long = "keep-only-latest")]
    pub keep_only_latest: bool,
}

impl DownloadCommand {
    /// Batch-wide download defaults from the flags.
    pub const fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            skip_if_exists: self.skip_existing,
            no_metadata: self.no_metadata,
            flatten_dir: self.flatten,
            keep_only_latest: self.keep_only_latest,
        }
    }

    /// Batch-wide filter defaults from the flags.
    pub fn filter_options(&self) -> FilterOptions {
        let mut filters = FilterOptions::default().with_prerelease(self.pre_release);
        if !self.platforms.is_empty() {
            filters = filters.with_platforms(self.platforms.iter().copied());
        }
        if let Some(fallback) = self.platform_fallback {
            filters = filters.with_fallback(fallback);
        }
        if let Some(ref engine) = self.engine_version {
            filters = filters.with_engine_version(engine.clone());
        }
        filters
    }
}

#[derive(Debug, Args)]
pub struct InventoryCommand {
    /// Directory to inspect
    #[arg(long = "target-dir", env = "EXTMIRROR_TARGET_DIR")]
    pub target_dir: PathBuf,

    /// The directory uses the flat layout
    #[arg(long)]
    pub flatten: bool,
}
