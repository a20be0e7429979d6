//! Download handler.
//!
//! Builds batch defaults from flags, merges identifiers from the command
//! line and `--from`, and runs one orchestrator batch against the chosen
//! marketplace.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use extmirror_core::{ExtensionQuery, ExtensionSource};
use extmirror_download::{
    ArtifactTransport, BatchSummary, Orchestrator, OrchestratorConfig, ReqwestTransport,
    read_task_spec,
};
use extmirror_jetbrains::{DefaultPluginRepositoryClient, PluginRepositoryConfig};
use extmirror_marketplace::{DefaultGalleryClient, GalleryClientConfig};
use tracing::{debug, warn};

use crate::commands::{DownloadCommand, Marketplace};
use crate::error::CliError;
use crate::presentation::{ProgressEmitter, format_summary};

/// Per-request HTTP timeout for artifact downloads.
const TRANSPORT_TIMEOUT: Duration = Duration::from_secs(15);

/// Execute the download command against the selected marketplace.
pub async fn execute(cmd: &DownloadCommand) -> Result<BatchSummary, CliError> {
    let source = build_source(cmd)?;
    let transport = ReqwestTransport::new(TRANSPORT_TIMEOUT)?;
    execute_with(cmd, source, Arc::new(transport)).await
}

fn build_source(cmd: &DownloadCommand) -> Result<Arc<dyn ExtensionSource>, CliError> {
    match cmd.marketplace {
        Marketplace::Vscode => {
            if cmd.target_build.is_some() {
                warn!("--target-build only applies to the JetBrains marketplace, ignoring it");
            }
            Ok(Arc::new(DefaultGalleryClient::new(&GalleryClientConfig::default())?))
        }
        Marketplace::Jetbrains => {
            let mut config = PluginRepositoryConfig::new().with_concurrency(cmd.concurrency);
            if let Some(ref build) = cmd.target_build {
                config = config.with_target_build(build.clone());
            }
            Ok(Arc::new(DefaultPluginRepositoryClient::new(&config)?))
        }
    }
}

/// Execute the download command with explicit collaborators.
pub async fn execute_with(
    cmd: &DownloadCommand,
    source: Arc<dyn ExtensionSource>,
    transport: Arc<dyn ArtifactTransport>,
) -> Result<BatchSummary, CliError> {
    let queries = collect_queries(cmd).await?;
    if queries.is_empty() {
        return Err(CliError::Arguments(
            "no extension identifiers given (pass IDS or --from FILE)".to_string(),
        ));
    }

    let config = build_config(cmd);
    let temp_dir = config.temp_dir();
    let emitter = Arc::new(ProgressEmitter::new());
    let orchestrator = Orchestrator::new(source, transport, config).with_emitter(emitter.clone());

    let result = orchestrator.run(&queries).await;
    emitter.finish();

    if cmd.temp_dir.is_none() {
        remove_temp_dir(temp_dir).await;
    }

    let summary = result?;
    print!("{}", format_summary(&summary));
    if summary.is_success() {
        Ok(summary)
    } else {
        Err(CliError::PartialFailure {
            failed: summary.failed.len(),
        })
    }
}

/// Command-line ids first, then task-spec entries.
///
/// Later entries override earlier ones for the same identifier, so a spec
/// file can refine an id that was also given on the command line.
async fn collect_queries(cmd: &DownloadCommand) -> Result<Vec<ExtensionQuery>, CliError> {
    let mut queries: Vec<ExtensionQuery> = cmd.ids.iter().map(|id| id.as_str().into()).collect();
    if let Some(ref path) = cmd.from {
        let from_file = read_task_spec(path).await?;
        debug!(path = %path.display(), entries = from_file.len(), "Loaded task spec");
        queries.extend(from_file);
    }
    Ok(queries)
}

fn build_config(cmd: &DownloadCommand) -> OrchestratorConfig {
    let mut config = OrchestratorConfig::new(&cmd.target_dir)
        .with_concurrency(cmd.concurrency)
        .with_download_defaults(cmd.download_options())
        .with_filter_defaults(cmd.filter_options());
    if let Some(ref dir) = cmd.temp_dir {
        config = config.with_temp_dir(dir);
    }
    if let Some(ref path) = cmd.task_spec_out {
        config = config.with_task_spec_out(path);
    }
    config
}

/// Best-effort removal of the defaulted scratch directory.
async fn remove_temp_dir(dir: PathBuf) {
    match tokio::fs::remove_dir_all(&dir).await {
        Ok(()) => debug!(path = %dir.display(), "Removed temp directory"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %dir.display(), error = %e, "Failed to remove temp directory"),
    }
}
