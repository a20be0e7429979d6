//! Download orchestrator.
//!
//! Drives one batch end to end:
//!
//! 1. Normalize queries into one spec per identifier.
//! 2. Fetch every record in a single call to the [`ExtensionSource`].
//! 3. Select versions per extension.
//! 4. Fan out one task per (extension, version) on a [`JoinSet`], bounded by
//!    a semaphore shared with the fetch.
//! 5. Collect per-task outcomes into a [`BatchSummary`].
//!
//! Only systemic failures (the fetch call, creating directories, writing the
//! task spec) fail the run. Dropping the `run` future aborts every task.

mod config;
mod summary;
mod task;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::fs;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use extmirror_core::{
    DownloadError, DownloadEvent, DownloadEventEmitterPort, ExtensionQuery, ExtensionRecord,
    ExtensionSource, ExtensionSpec, NoopDownloadEmitter,
};

use crate::layout::is_safe_id;
use crate::lock::NamedLock;
use crate::selector::select;
use crate::sidecar::MetadataStore;
use crate::transport::ArtifactTransport;
use crate::writer::AtomicFileWriter;

pub use config::{DEFAULT_CONCURRENCY, DEFAULT_TEMP_DIR_NAME, OrchestratorConfig};
pub use summary::{BatchSummary, CompletedDownload, FailedDownload};

use task::{DownloadTask, TaskContext};

/// Runs download batches against one marketplace.
pub struct Orchestrator {
    source: Arc<dyn ExtensionSource>,
    transport: Arc<dyn ArtifactTransport>,
    emitter: Arc<dyn DownloadEventEmitterPort>,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn ExtensionSource>,
        transport: Arc<dyn ArtifactTransport>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            source,
            transport,
            emitter: Arc::new(NoopDownloadEmitter::new()),
            config,
        }
    }

    /// Report progress through `emitter`.
    #[must_use]
    pub fn with_emitter(mut self, emitter: Arc<dyn DownloadEventEmitterPort>) -> Self {
        self.emitter = emitter;
        self
    }

    #[must_use]
    pub const fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Normalize queries into one spec per identifier, in first-seen order.
    ///
    /// Identifiers compare case-insensitively; a later entry for the same
    /// identifier replaces the earlier one.
    #[must_use]
    pub fn normalize(&self, queries: &[ExtensionQuery]) -> Vec<ExtensionSpec> {
        let mut specs: IndexMap<String, ExtensionSpec> = IndexMap::new();
        for query in queries {
            let id = query.ext_id();
            if !is_safe_id(id) {
                warn!(ext_id = %id, "Ignoring invalid extension identifier");
                continue;
            }
            let spec = query.resolve(self.config.download_defaults, &self.config.filter_defaults);
            specs.insert(id.to_ascii_lowercase(), spec);
        }
        specs.into_values().collect()
    }

    /// Download the selected versions of every queried extension.
    pub async fn run(&self, queries: &[ExtensionQuery]) -> Result<BatchSummary, DownloadError> {
        let specs = self.normalize(queries);
        let mut summary = BatchSummary::default();
        if specs.is_empty() {
            return Ok(summary);
        }

        let temp_dir = self.config.temp_dir();
        fs::create_dir_all(&self.config.target_dir).await?;
        fs::create_dir_all(&temp_dir).await?;

        let permits = Arc::new(Semaphore::new(self.config.concurrency));
        let records = {
            let _permit = permits
                .acquire()
                .await
                .map_err(|_| DownloadError::other("download semaphore closed"))?;
            let ids: Vec<String> = specs.iter().map(|s| s.ext_id.clone()).collect();
            info!(source = self.source.name(), count = ids.len(), "Fetching extension records");
            self.source.fetch_extensions(&ids).await?
        };

        let resolved = self.resolve(specs, &records, &mut summary);

        let mut tasks = Vec::new();
        for (spec, record) in &resolved {
            let versions = select(&record.versions, &spec.filter_options);
            if versions.is_empty() {
                warn!(ext_id = %record.id(), "No matching version found");
                self.emitter.emit(DownloadEvent::NoMatchingVersion {
                    ext_id: record.id().to_string(),
                });
                summary.unmatched.push(record.id().to_string());
                continue;
            }
            for version in versions {
                tasks.push(DownloadTask {
                    file_name: self.source.artifact_file_name(&record.identity, &version),
                    identity: record.identity.clone(),
                    version,
                    options: spec.download_options,
                });
            }
        }

        self.emitter.emit(DownloadEvent::BatchStarted { tasks: tasks.len() });
        info!(tasks = tasks.len(), "Starting downloads");

        let ctx = Arc::new(TaskContext {
            writer: AtomicFileWriter::new(Arc::clone(&self.transport))
                .with_retry_policy(self.config.retry)
                .with_read_timeout(self.config.read_timeout),
            store: MetadataStore::new(NamedLock::new()).with_lock_timeout(self.config.lock_timeout),
            permits,
            emitter: Arc::clone(&self.emitter),
            target_dir: self.config.target_dir.clone(),
            temp_dir,
        });

        let mut running = JoinSet::new();
        let mut panicked = HashMap::new();
        for task in tasks {
            let on_panic = task.failure(DownloadError::other("download task panicked"));
            let handle = running.spawn(task.run(Arc::clone(&ctx)));
            panicked.insert(handle.id(), on_panic);
        }

        while let Some(joined) = running.join_next().await {
            match joined {
                Ok(Ok(done)) => summary.completed.push(done),
                Ok(Err(failed)) => summary.failed.push(failed),
                Err(e) => {
                    error!(error = %e, "Download task aborted");
                    if let Some(failed) = panicked.remove(&e.id()) {
                        summary.failed.push(failed);
                    }
                }
            }
        }

        summary.sort();
        self.emitter.emit(DownloadEvent::BatchFinished {
            completed: summary.completed.len(),
            failed: summary.failed.len(),
        });
        info!(
            completed = summary.completed.len(),
            failed = summary.failed.len(),
            missing = summary.missing.len(),
            unmatched = summary.unmatched.len(),
            "Batch finished"
        );

        if let Some(path) = &self.config.task_spec_out {
            let resolved_specs: Vec<ExtensionSpec> =
                resolved.into_iter().map(|(spec, _)| spec).collect();
            write_task_spec(path, &resolved_specs).await?;
        }

        Ok(summary)
    }

    /// Pair specs with fetched records, reporting identifiers that were not
    /// returned. Record lookup ignores ASCII case.
    fn resolve(
        &self,
        specs: Vec<ExtensionSpec>,
        records: &HashMap<String, ExtensionRecord>,
        summary: &mut BatchSummary,
    ) -> Vec<(ExtensionSpec, ExtensionRecord)> {
        let by_lower: HashMap<String, &ExtensionRecord> = records
            .values()
            .map(|r| (r.id().to_ascii_lowercase(), r))
            .collect();

        let mut resolved = Vec::with_capacity(specs.len());
        for spec in specs {
            let found = records
                .get(&spec.ext_id)
                .or_else(|| by_lower.get(&spec.ext_id.to_ascii_lowercase()).copied());
            match found {
                Some(record) => resolved.push((spec, record.clone())),
                None => {
                    warn!(ext_id = %spec.ext_id, "No extension found");
                    self.emitter.emit(DownloadEvent::ExtensionMissing {
                        ext_id: spec.ext_id.clone(),
                    });
                    summary.missing.push(spec.ext_id);
                }
            }
        }
        resolved
    }
}

/// Write resolved specs as a pretty-printed JSON array.
pub async fn write_task_spec(path: &Path, specs: &[ExtensionSpec]) -> Result<(), DownloadError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).await?;
    }
    let json = serde_json::to_string_pretty(specs)
        .map_err(|e| DownloadError::other(format!("failed to serialize task spec: {e}")))?;
    fs::write(path, json).await?;
    debug!(path = %path.display(), entries = specs.len(), "Task spec written");
    Ok(())
}

/// Read a task spec (a JSON array of identifiers and override objects).
pub async fn read_task_spec(path: &Path) -> Result<Vec<ExtensionQuery>, DownloadError> {
    let content = fs::read_to_string(path).await?;
    serde_json::from_str(&content)
        .map_err(|e| DownloadError::parse(path.display().to_string(), e.to_string()))
}
