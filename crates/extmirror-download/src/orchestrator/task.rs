//! A single (extension, version) download task.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use extmirror_core::{
    DownloadError, DownloadEvent, DownloadEventEmitterPort, DownloadOptions,
    DownloadedVersionRecord, ExtensionIdentity, FileName, VersionRecord,
};

use super::summary::{CompletedDownload, FailedDownload};
use crate::layout::ExtensionLayout;
use crate::lock::LockOwner;
use crate::sidecar::MetadataStore;
use crate::writer::{AtomicFileWriter, WriteRequest};

/// Shared state every task of a run needs.
pub(crate) struct TaskContext {
    pub writer: AtomicFileWriter,
    pub store: MetadataStore,
    pub permits: Arc<Semaphore>,
    pub emitter: Arc<dyn DownloadEventEmitterPort>,
    pub target_dir: PathBuf,
    pub temp_dir: PathBuf,
}

/// One scheduled download.
pub(crate) struct DownloadTask {
    pub identity: ExtensionIdentity,
    pub version: VersionRecord,
    pub file_name: FileName,
    pub options: DownloadOptions,
}

impl DownloadTask {
    pub fn ext_id(&self) -> &str {
        &self.identity.id
    }

    /// Run to completion, reporting the outcome through events.
    ///
    /// The concurrency permit covers the whole task, from `TaskStarted`
    /// through the sidecar merge to the terminal event.
    pub async fn run(self, ctx: Arc<TaskContext>) -> Result<CompletedDownload, FailedDownload> {
        let Ok(_permit) = ctx.permits.acquire().await else {
            return Err(self.failure(DownloadError::other("download semaphore closed")));
        };
        ctx.emitter.emit(DownloadEvent::TaskStarted {
            ext_id: self.identity.id.clone(),
            version: self.version.version.clone(),
            platform: self.version.target_platform,
        });

        match self.execute(&ctx).await {
            Ok(done) => {
                ctx.emitter.emit(DownloadEvent::TaskCompleted {
                    ext_id: done.ext_id.clone(),
                    version: done.version.clone(),
                    platform: done.platform,
                    file_name: file_name_of(&done.path),
                    skipped: done.skipped,
                });
                Ok(done)
            }
            Err(error) => {
                warn!(
                    ext_id = %self.identity.id,
                    version = %self.version.version,
                    platform = %self.version.target_platform,
                    error = %error,
                    "Download task failed"
                );
                ctx.emitter.emit(DownloadEvent::TaskFailed {
                    ext_id: self.identity.id.clone(),
                    version: self.version.version.clone(),
                    platform: self.version.target_platform,
                    error: error.to_string(),
                });
                Err(self.failure(error))
            }
        }
    }

    /// Failure record for this task.
    pub fn failure(&self, error: DownloadError) -> FailedDownload {
        FailedDownload {
            ext_id: self.identity.id.clone(),
            version: self.version.version.clone(),
            platform: self.version.target_platform,
            error,
        }
    }

    async fn execute(&self, ctx: &TaskContext) -> Result<CompletedDownload, DownloadError> {
        let layout = ExtensionLayout::new(&ctx.target_dir, self.options.flatten_dir);
        let ext_dir = layout.extension_dir(self.ext_id());

        debug!(ext_id = %self.identity.id, version = %self.version.version, "Downloading");
        let outcome = ctx
            .writer
            .write(&WriteRequest {
                url: &self.version.download_url,
                target_dir: &ext_dir,
                file_name: &self.file_name,
                temp_dir: &ctx.temp_dir,
                skip_if_exists: self.options.skip_if_exists,
            })
            .await?;

        let owner = LockOwner::new();
        let sidecar = layout.sidecar_path(self.ext_id());
        if self.options.no_metadata {
            ctx.store.remove(owner, &sidecar).await?;
        } else {
            ctx.store
                .merge(
                    owner,
                    &sidecar,
                    &self.identity,
                    DownloadedVersionRecord::new(self.version.clone(), outcome.file_name()),
                    self.options.keep_only_latest,
                )
                .await?;
        }

        Ok(CompletedDownload {
            ext_id: self.identity.id.clone(),
            version: self.version.version.clone(),
            platform: self.version.target_platform,
            path: outcome.path,
            skipped: outcome.skipped,
        })
    }
}

fn file_name_of(path: &std::path::Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
