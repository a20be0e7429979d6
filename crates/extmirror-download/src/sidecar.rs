//! Metadata merge engine.
//!
//! Every read-modify-write of a sidecar runs under the [`NamedLock`] keyed by
//! the sidecar path, so merges into one sidecar never interleave.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;

use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use extmirror_core::{
    DownloadError, DownloadedVersionRecord, ExtensionIdentity, MetadataSidecar, TargetPlatform,
};

use crate::lock::{LockOwner, NamedLock};

/// Read a sidecar, treating a corrupt document as absent.
///
/// Returns `Ok(None)` when the file does not exist or cannot be parsed; I/O
/// failures other than "not found" are errors.
pub async fn read_sidecar(path: &Path) -> Result<Option<MetadataSidecar>, DownloadError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!(path = %path.display(), "Sidecar is not valid UTF-8, starting fresh");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    match MetadataSidecar::from_json(&path.display().to_string(), &content) {
        Ok(sidecar) => Ok(Some(sidecar)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Corrupt sidecar, starting fresh");
            Ok(None)
        }
    }
}

/// Serializes and persists sidecars.
#[derive(Debug, Clone)]
pub struct MetadataStore {
    lock: NamedLock,
    lock_timeout: Option<Duration>,
}

impl MetadataStore {
    pub const fn new(lock: NamedLock) -> Self {
        Self {
            lock,
            lock_timeout: None,
        }
    }

    /// Bound how long a merge waits for the sidecar lock.
    #[must_use]
    pub const fn with_lock_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Record a downloaded version in the sidecar at `path`.
    ///
    /// Any entry for the same (version, platform) is replaced. With
    /// `keep_only_latest`, only the top entry of each platform is kept and
    /// the artifacts of dropped entries are deleted from the sidecar's
    /// directory. Returns the document as written.
    pub async fn merge(
        &self,
        owner: LockOwner,
        path: &Path,
        identity: &ExtensionIdentity,
        record: DownloadedVersionRecord,
        keep_only_latest: bool,
    ) -> Result<MetadataSidecar, DownloadError> {
        let token = path.display().to_string();
        let _guard = self.lock.lock_as(&token, owner, self.lock_timeout).await?;

        let previous = read_sidecar(path).await?;
        let mut sidecar = MetadataSidecar::new(identity.clone());
        sidecar.versions = previous.map(|s| s.versions).unwrap_or_default();
        sidecar
            .versions
            .retain(|v| !v.version.same_build(&record.version));
        sidecar.versions.insert(0, record);

        let superseded = if keep_only_latest {
            prune_to_latest(&mut sidecar.versions)
        } else {
            Vec::new()
        };

        sidecar.sort_versions();
        write_document(path, &sidecar.to_json()?).await?;

        if let Some(dir) = path.parent() {
            let retained: HashSet<&str> =
                sidecar.versions.iter().map(|v| v.file_name.as_str()).collect();
            for old in &superseded {
                if !retained.contains(old.file_name.as_str()) {
                    delete_artifact(dir, &old.file_name).await;
                }
            }
        }

        debug!(path = %path.display(), versions = sidecar.versions.len(), "Sidecar updated");
        Ok(sidecar)
    }

    /// Delete the sidecar at `path` if present. Returns whether a file was
    /// removed.
    pub async fn remove(&self, owner: LockOwner, path: &Path) -> Result<bool, DownloadError> {
        let token = path.display().to_string();
        let _guard = self.lock.lock_as(&token, owner, self.lock_timeout).await?;

        match fs::remove_file(path).await {
            Ok(()) => {
                debug!(path = %path.display(), "Sidecar removed");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keep only the highest entry per platform; returns the dropped entries.
fn prune_to_latest(versions: &mut Vec<DownloadedVersionRecord>) -> Vec<DownloadedVersionRecord> {
    let mut best: BTreeMap<TargetPlatform, usize> = BTreeMap::new();
    for (i, v) in versions.iter().enumerate() {
        let slot = best.entry(v.version.target_platform).or_insert(i);
        if v.cmp_precedence(&versions[*slot]).is_gt() {
            *slot = i;
        }
    }

    let keep: HashSet<usize> = best.into_values().collect();
    let (kept, dropped): (Vec<_>, Vec<_>) = std::mem::take(versions)
        .into_iter()
        .enumerate()
        .partition(|(i, _)| keep.contains(i));
    *versions = kept.into_iter().map(|(_, v)| v).collect();
    dropped.into_iter().map(|(_, v)| v).collect()
}

/// Truncate and rewrite, then flush to disk.
async fn write_document(path: &Path, json: &str) -> Result<(), DownloadError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).await?;
    }
    let mut file = fs::File::create(path).await?;
    file.write_all(json.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

async fn delete_artifact(dir: &Path, file_name: &str) {
    if Path::new(file_name).file_name().and_then(|n| n.to_str()) != Some(file_name) {
        warn!(file_name, "Refusing to delete artifact outside the extension directory");
        return;
    }
    let path = dir.join(file_name);
    match fs::remove_file(&path).await {
        Ok(()) => debug!(path = %path.display(), "Deleted superseded artifact"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "Failed to delete superseded artifact"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use extmirror_core::VersionRecord;
    use tempfile::TempDir;

    fn downloaded(version: &str, platform: TargetPlatform) -> DownloadedVersionRecord {
        let record = VersionRecord::new(version, format!("https://x/{version}"))
            .with_platform(platform);
        let name = if platform.is_universal() {
            format!("acme.tool-{version}.vsix")
        } else {
            format!("acme.tool-{version}@{platform}.vsix")
        };
        DownloadedVersionRecord::new(record, name)
    }

    fn store() -> MetadataStore {
        MetadataStore::new(NamedLock::new())
    }

    fn identity() -> ExtensionIdentity {
        ExtensionIdentity::new("acme.tool")
    }

    #[tokio::test]
    async fn test_first_merge_creates_sidecar() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");

        let sidecar = store()
            .merge(
                LockOwner::new(),
                &path,
                &identity(),
                downloaded("1.0.0", TargetPlatform::Universal),
                false,
            )
            .await
            .unwrap();

        assert_eq!(sidecar.versions.len(), 1);
        let on_disk = read_sidecar(&path).await.unwrap().unwrap();
        assert_eq!(on_disk, sidecar);
    }

    #[tokio::test]
    async fn test_keep_only_latest_prunes_and_deletes_artifact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        let store = store();
        let old = downloaded("1.0.0", TargetPlatform::Universal);
        std::fs::write(dir.path().join(&old.file_name), "old").unwrap();
        store
            .merge(LockOwner::new(), &path, &identity(), old.clone(), false)
            .await
            .unwrap();

        let new = downloaded("1.1.0", TargetPlatform::Universal);
        std::fs::write(dir.path().join(&new.file_name), "new").unwrap();
        let sidecar = store
            .merge(LockOwner::new(), &path, &identity(), new.clone(), true)
            .await
            .unwrap();

        assert_eq!(sidecar.versions, vec![new.clone()]);
        assert!(!dir.path().join(&old.file_name).exists());
        assert!(dir.path().join(&new.file_name).exists());
    }

    #[tokio::test]
    async fn test_keep_only_latest_is_per_platform() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        let store = store();
        for v in [
            downloaded("1.0.0", TargetPlatform::LinuxX64),
            downloaded("1.0.0", TargetPlatform::Win32X64),
            downloaded("0.9.0", TargetPlatform::Win32X64),
        ] {
            store.merge(LockOwner::new(), &path, &identity(), v, false).await.unwrap();
        }

        let sidecar = store
            .merge(
                LockOwner::new(),
                &path,
                &identity(),
                downloaded("1.1.0", TargetPlatform::LinuxX64),
                true,
            )
            .await
            .unwrap();

        let kept: Vec<(&str, TargetPlatform)> = sidecar
            .versions
            .iter()
            .map(|v| (v.version.version.as_str(), v.version.target_platform))
            .collect();
        assert_eq!(
            kept,
            vec![("1.1.0", TargetPlatform::LinuxX64), ("1.0.0", TargetPlatform::Win32X64)]
        );
    }

    #[tokio::test]
    async fn test_merging_same_build_twice_keeps_one_entry() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        let store = store();

        let first = downloaded("1.0.0", TargetPlatform::Universal);
        let mut second = first.clone();
        second.version.download_url = "https://mirror/1.0.0".into();

        store.merge(LockOwner::new(), &path, &identity(), first, false).await.unwrap();
        let sidecar = store
            .merge(LockOwner::new(), &path, &identity(), second.clone(), false)
            .await
            .unwrap();

        assert_eq!(sidecar.versions, vec![second]);
    }

    #[tokio::test]
    async fn test_corrupt_sidecar_is_replaced() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        std::fs::write(&path, "{\"id\": \"acme.tool\", \"versions\": [").unwrap();

        let sidecar = store()
            .merge(
                LockOwner::new(),
                &path,
                &identity(),
                downloaded("2.0.0", TargetPlatform::Universal),
                false,
            )
            .await
            .unwrap();

        assert_eq!(sidecar.versions.len(), 1);
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.ends_with('}'));
        assert!(MetadataSidecar::from_json("x", &text).is_ok());
    }

    #[tokio::test]
    async fn test_rewrite_leaves_no_trailing_bytes() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        let store = store();
        let mut long = downloaded("1.0.0", TargetPlatform::Universal);
        long.version.dependencies = (0..50).map(|i| format!("acme.dep-{i}")).collect();
        store.merge(LockOwner::new(), &path, &identity(), long, false).await.unwrap();

        store
            .merge(
                LockOwner::new(),
                &path,
                &identity(),
                downloaded("1.0.0", TargetPlatform::Universal),
                false,
            )
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(MetadataSidecar::from_json("x", &text).is_ok());
    }

    #[tokio::test]
    async fn test_remove_is_noop_when_absent() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        let store = store();

        assert!(!store.remove(LockOwner::new(), &path).await.unwrap());
        std::fs::write(&path, "{}").unwrap();
        assert!(store.remove(LockOwner::new(), &path).await.unwrap());
        assert!(!path.exists());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_merges_lose_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("acme.tool.json");
        let store = store();

        let mut tasks = Vec::new();
        for minor in 0..12 {
            let store = store.clone();
            let path = path.clone();
            tasks.push(tokio::spawn(async move {
                store
                    .merge(
                        LockOwner::new(),
                        &path,
                        &identity(),
                        downloaded(&format!("1.{minor}.0"), TargetPlatform::Universal),
                        false,
                    )
                    .await
                    .unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let sidecar = read_sidecar(&path).await.unwrap().unwrap();
        assert_eq!(sidecar.versions.len(), 12);
        assert_eq!(sidecar.versions[0].version.version, "1.11.0");
    }
}
