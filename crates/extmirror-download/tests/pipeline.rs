//! End-to-end tests of the download pipeline against in-memory fakes.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio_test::assert_ok;

use extmirror_core::{
    DownloadError, DownloadEvent, DownloadEventEmitterPort, DownloadOptions, ExtensionIdentity,
    ExtensionQuery, ExtensionRecord, ExtensionSource, FileName, MetadataSidecar, TargetPlatform,
    VersionRecord, artifact_stem,
};
use extmirror_download::{
    ArtifactResponse, ArtifactTransport, Orchestrator, OrchestratorConfig, scan_inventory,
};

/// Marketplace fake with literal `.vsix` names.
struct Catalog {
    records: Mutex<HashMap<String, ExtensionRecord>>,
}

impl Catalog {
    fn new(records: Vec<ExtensionRecord>) -> Self {
        Self {
            records: Mutex::new(records.into_iter().map(|r| (r.id().to_string(), r)).collect()),
        }
    }

    fn publish(&self, id: &str, version: VersionRecord) {
        self.records
            .lock()
            .unwrap()
            .get_mut(id)
            .unwrap()
            .versions
            .push(version);
    }
}

#[async_trait]
impl ExtensionSource for Catalog {
    fn name(&self) -> &str {
        "catalog"
    }

    async fn fetch_extensions(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ExtensionRecord>, DownloadError> {
        let records = self.records.lock().unwrap();
        Ok(ids
            .iter()
            .filter_map(|id| records.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    fn artifact_file_name(&self, extension: &ExtensionIdentity, version: &VersionRecord) -> FileName {
        FileName::Literal(format!("{}.vsix", artifact_stem(extension, version)))
    }
}

/// Transport that serves the URL as the body after a short delay.
#[derive(Default)]
struct SlowTransport {
    opens: AtomicUsize,
}

#[async_trait]
impl ArtifactTransport for SlowTransport {
    async fn open(&self, url: &str) -> Result<ArtifactResponse, DownloadError> {
        self.opens.fetch_add(1, Ordering::SeqCst);
        let body = Bytes::from(url.to_string());
        Ok(ArtifactResponse {
            suggested_name: None,
            body: futures_util::stream::once(async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                Ok(body)
            })
            .boxed(),
        })
    }
}

/// Tracks how many tasks are between `TaskStarted` and their terminal event.
#[derive(Default)]
struct ConcurrencyGauge {
    active: AtomicUsize,
    peak: AtomicUsize,
    finished: Mutex<Option<(usize, usize)>>,
}

impl DownloadEventEmitterPort for ConcurrencyGauge {
    fn emit(&self, event: DownloadEvent) {
        match event {
            DownloadEvent::TaskStarted { .. } => {
                let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
            }
            DownloadEvent::TaskCompleted { .. } | DownloadEvent::TaskFailed { .. } => {
                self.active.fetch_sub(1, Ordering::SeqCst);
            }
            DownloadEvent::BatchFinished { completed, failed } => {
                *self.finished.lock().unwrap() = Some((completed, failed));
            }
            _ => {}
        }
    }
}

fn extension(id: &str, versions: &[&str]) -> ExtensionRecord {
    ExtensionRecord {
        identity: ExtensionIdentity::new(id),
        versions: versions
            .iter()
            .map(|v| VersionRecord::new(*v, format!("https://cdn.example/{id}/{v}.vsix")))
            .collect(),
    }
}

fn read_sidecar(path: &Path) -> MetadataSidecar {
    MetadataSidecar::from_json("sidecar", &std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_downloads_never_exceed_concurrency() {
    let root = TempDir::new().unwrap();
    let ids: Vec<String> = (0..10).map(|i| format!("acme.ext{i}")).collect();
    let catalog = Catalog::new(ids.iter().map(|id| extension(id, &["1.0.0"])).collect());
    let transport = Arc::new(SlowTransport::default());
    let gauge = Arc::new(ConcurrencyGauge::default());

    let orchestrator = Orchestrator::new(
        Arc::new(catalog),
        transport.clone(),
        OrchestratorConfig::new(root.path()).with_concurrency(3),
    )
    .with_emitter(gauge.clone());

    let queries: Vec<ExtensionQuery> = ids.iter().map(|id| id.as_str().into()).collect();
    let summary = assert_ok!(orchestrator.run(&queries).await);

    assert_eq!(summary.completed.len(), 10);
    assert!(gauge.peak.load(Ordering::SeqCst) <= 3);
    assert_eq!(gauge.active.load(Ordering::SeqCst), 0);
    assert_eq!(*gauge.finished.lock().unwrap(), Some((10, 0)));
    assert_eq!(transport.opens.load(Ordering::SeqCst), 10);
}

#[tokio::test]
async fn test_keep_only_latest_across_runs() {
    let root = TempDir::new().unwrap();
    let catalog = Arc::new(Catalog::new(vec![extension("acme.tool", &["1.0.0"])]));
    let config = OrchestratorConfig::new(root.path()).with_download_defaults(DownloadOptions {
        keep_only_latest: true,
        ..DownloadOptions::default()
    });
    let orchestrator = Orchestrator::new(
        catalog.clone(),
        Arc::new(SlowTransport::default()),
        config,
    );
    let dir = root.path().join("acme.tool");

    assert_ok!(orchestrator.run(&["acme.tool".into()]).await);
    assert!(dir.join("acme.tool-1.0.0.vsix").is_file());

    catalog.publish(
        "acme.tool",
        VersionRecord::new("1.1.0", "https://cdn.example/acme.tool/1.1.0.vsix"),
    );
    assert_ok!(orchestrator.run(&["acme.tool".into()]).await);

    let sidecar = read_sidecar(&dir.join("acme.tool.json"));
    let versions: Vec<&str> = sidecar
        .versions
        .iter()
        .map(|v| v.version.version.as_str())
        .collect();
    assert_eq!(versions, vec!["1.1.0"]);
    assert!(!dir.join("acme.tool-1.0.0.vsix").exists());
    assert!(dir.join("acme.tool-1.1.0.vsix").is_file());
}

#[tokio::test]
async fn test_history_accumulates_without_pruning() {
    let root = TempDir::new().unwrap();
    let catalog = Arc::new(Catalog::new(vec![extension("acme.tool", &["1.0.0"])]));
    let orchestrator = Orchestrator::new(
        catalog.clone(),
        Arc::new(SlowTransport::default()),
        OrchestratorConfig::new(root.path()),
    );

    assert_ok!(orchestrator.run(&["acme.tool".into()]).await);
    catalog.publish(
        "acme.tool",
        VersionRecord::new("2.0.0", "https://cdn.example/acme.tool/2.0.0.vsix"),
    );
    assert_ok!(orchestrator.run(&["acme.tool".into()]).await);

    let report = assert_ok!(scan_inventory(root.path(), false).await);
    assert_eq!(report.extensions.len(), 1);
    assert_eq!(report.extensions[0].latest_version(), Some("2.0.0"));
    assert_eq!(report.extensions[0].present.len(), 2);
    assert!(report.is_consistent());
}

#[tokio::test]
async fn test_skip_existing_makes_no_network_calls() {
    let root = TempDir::new().unwrap();
    let catalog = Arc::new(Catalog::new(vec![
        extension("a.one", &["1.0.0"]),
        extension("b.two", &["3.1.4"]),
    ]));
    let transport = Arc::new(SlowTransport::default());
    let config = OrchestratorConfig::new(root.path()).with_download_defaults(DownloadOptions {
        skip_if_exists: true,
        ..DownloadOptions::default()
    });
    let orchestrator = Orchestrator::new(catalog, transport.clone(), config);
    let queries: Vec<ExtensionQuery> = vec!["a.one".into(), "b.two".into()];

    let first = assert_ok!(orchestrator.run(&queries).await);
    assert_eq!(first.downloaded_count(), 2);

    let second = assert_ok!(orchestrator.run(&queries).await);
    assert_eq!(second.downloaded_count(), 0);
    assert!(second.completed.iter().all(|c| c.skipped));
    assert_eq!(transport.opens.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_flat_layout_shares_one_directory() {
    let root = TempDir::new().unwrap();
    let mut multi = extension("acme.native", &[]);
    multi.versions = vec![
        VersionRecord::new("1.0.0", "https://cdn.example/n/linux.vsix")
            .with_platform(TargetPlatform::LinuxX64),
        VersionRecord::new("1.0.0", "https://cdn.example/n/win.vsix")
            .with_platform(TargetPlatform::Win32X64),
    ];
    let catalog = Catalog::new(vec![multi, extension("acme.tool", &["0.1.0"])]);
    let config = OrchestratorConfig::new(root.path()).with_download_defaults(DownloadOptions {
        flatten_dir: true,
        ..DownloadOptions::default()
    });
    let orchestrator = Orchestrator::new(Arc::new(catalog), Arc::new(SlowTransport::default()), config);

    let summary = assert_ok!(orchestrator.run(&["acme.native".into(), "acme.tool".into()]).await);
    assert_eq!(summary.completed.len(), 3);

    for name in [
        "acme.native-1.0.0@linux-x64.vsix",
        "acme.native-1.0.0@win32-x64.vsix",
        "acme.native.json",
        "acme.tool-0.1.0.vsix",
        "acme.tool.json",
    ] {
        assert!(root.path().join(name).is_file(), "missing {name}");
    }
    let sidecar = read_sidecar(&root.path().join("acme.native.json"));
    assert_eq!(sidecar.versions.len(), 2);

    let report = assert_ok!(scan_inventory(root.path(), true).await);
    assert_eq!(report.extensions.len(), 2);
    assert!(report.unrecorded.is_empty());
}
