//! Inventory of a download directory.
//!
//! Loads every sidecar under a target directory and cross-checks it against
//! the files on disk: recorded artifacts that are present or missing, and
//! artifact files no sidecar mentions (for instance when a run stopped
//! between publishing an artifact and recording it).

use std::collections::{BTreeMap, BTreeSet};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::fs;
use tracing::warn;

use extmirror_core::{DownloadError, MetadataSidecar};

/// State of one recorded extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionInventory {
    pub sidecar: PathBuf,
    pub metadata: MetadataSidecar,
    /// Recorded artifacts found on disk.
    pub present: Vec<String>,
    /// Recorded artifacts missing from disk.
    pub missing: Vec<String>,
}

impl ExtensionInventory {
    /// Version string of the highest recorded entry.
    #[must_use]
    pub fn latest_version(&self) -> Option<&str> {
        self.metadata
            .versions
            .first()
            .map(|v| v.version.version.as_str())
    }
}

/// Result of scanning a download directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InventoryReport {
    pub extensions: Vec<ExtensionInventory>,
    /// Artifact files not referenced by any sidecar.
    pub unrecorded: Vec<PathBuf>,
    /// Sidecars that could not be parsed.
    pub corrupt: Vec<PathBuf>,
}

impl InventoryReport {
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.unrecorded.is_empty()
            && self.corrupt.is_empty()
            && self.extensions.iter().all(|e| e.missing.is_empty())
    }
}

/// Scan `target_dir` laid out flat or one directory per extension.
pub async fn scan(target_dir: &Path, flatten: bool) -> Result<InventoryReport, DownloadError> {
    let mut report = InventoryReport::default();

    // Directory -> sidecar paths found in it.
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();
    if flatten {
        let sidecars = list_files(target_dir)
            .await?
            .into_iter()
            .filter(|name| name.ends_with(".json"))
            .map(|name| target_dir.join(name))
            .collect();
        groups.insert(target_dir.to_path_buf(), sidecars);
    } else {
        for name in list_dirs(target_dir).await? {
            let dir = target_dir.join(&name);
            let sidecar = dir.join(format!("{name}.json"));
            if fs::metadata(&sidecar).await.is_ok_and(|m| m.is_file()) {
                groups.insert(dir, vec![sidecar]);
            }
        }
    }

    for (dir, sidecars) in groups {
        let files: BTreeSet<String> = list_files(&dir).await?.into_iter().collect();
        let mut recorded: BTreeSet<String> = BTreeSet::new();

        for sidecar in sidecars {
            let Some(metadata) = load(&sidecar).await? else {
                report.corrupt.push(sidecar);
                continue;
            };
            let (present, missing): (Vec<String>, Vec<String>) = metadata
                .versions
                .iter()
                .map(|v| v.file_name.clone())
                .partition(|name| files.contains(name));
            recorded.extend(metadata.versions.iter().map(|v| v.file_name.clone()));
            report.extensions.push(ExtensionInventory {
                sidecar,
                metadata,
                present,
                missing,
            });
        }

        report.unrecorded.extend(
            files
                .iter()
                .filter(|name| !name.ends_with(".json") && !recorded.contains(*name))
                .map(|name| dir.join(name)),
        );
    }

    report
        .extensions
        .sort_by(|a, b| a.metadata.identity.id.cmp(&b.metadata.identity.id));
    Ok(report)
}

async fn load(path: &Path) -> Result<Option<MetadataSidecar>, DownloadError> {
    let content = match fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::InvalidData => {
            warn!(path = %path.display(), "Sidecar is not valid UTF-8");
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };
    match MetadataSidecar::from_json(&path.display().to_string(), &content) {
        Ok(sidecar) => Ok(Some(sidecar)),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Skipping corrupt sidecar");
            Ok(None)
        }
    }
}

/// Names of visible regular files in `dir`.
async fn list_files(dir: &Path) -> Result<Vec<String>, DownloadError> {
    list(dir, false).await
}

/// Names of visible subdirectories of `dir`.
async fn list_dirs(dir: &Path) -> Result<Vec<String>, DownloadError> {
    list(dir, true).await
}

async fn list(dir: &Path, want_dirs: bool) -> Result<Vec<String>, DownloadError> {
    let mut names = Vec::new();
    let mut entries = match fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(names),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let file_type = entry.file_type().await?;
        if (want_dirs && file_type.is_dir()) || (!want_dirs && file_type.is_file()) {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extmirror_core::{DownloadedVersionRecord, ExtensionIdentity, VersionRecord};
    use tempfile::TempDir;

    fn write_sidecar(path: &Path, id: &str, files: &[(&str, &str)]) {
        let mut sidecar = MetadataSidecar::new(ExtensionIdentity::new(id));
        for (version, file) in files {
            sidecar.versions.push(DownloadedVersionRecord::new(
                VersionRecord::new(*version, format!("https://x/{file}")),
                *file,
            ));
        }
        sidecar.sort_versions();
        std::fs::write(path, sidecar.to_json().unwrap()).unwrap();
    }

    #[tokio::test]
    async fn test_nested_layout_reports_present_missing_and_unrecorded() {
        let root = TempDir::new().unwrap();
        let dir = root.path().join("acme.tool");
        std::fs::create_dir_all(&dir).unwrap();
        write_sidecar(
            &dir.join("acme.tool.json"),
            "acme.tool",
            &[("1.0.0", "acme.tool-1.0.0.vsix"), ("1.1.0", "acme.tool-1.1.0.vsix")],
        );
        std::fs::write(dir.join("acme.tool-1.1.0.vsix"), "x").unwrap();
        std::fs::write(dir.join("acme.tool-1.2.0.vsix"), "x").unwrap();
        std::fs::create_dir_all(root.path().join(".temp")).unwrap();

        let report = scan(root.path(), false).await.unwrap();

        assert_eq!(report.extensions.len(), 1);
        let ext = &report.extensions[0];
        assert_eq!(ext.latest_version(), Some("1.1.0"));
        assert_eq!(ext.present, vec!["acme.tool-1.1.0.vsix"]);
        assert_eq!(ext.missing, vec!["acme.tool-1.0.0.vsix"]);
        assert_eq!(report.unrecorded, vec![dir.join("acme.tool-1.2.0.vsix")]);
        assert!(!report.is_consistent());
    }

    #[tokio::test]
    async fn test_flat_layout_and_corrupt_sidecar() {
        let root = TempDir::new().unwrap();
        write_sidecar(&root.path().join("a.one.json"), "a.one", &[("1.0.0", "a.one-1.0.0.vsix")]);
        write_sidecar(&root.path().join("b.two.json"), "b.two", &[("2.0.0", "b.two-2.0.0.vsix")]);
        std::fs::write(root.path().join("c.three.json"), "not json").unwrap();
        std::fs::write(root.path().join("a.one-1.0.0.vsix"), "x").unwrap();
        std::fs::write(root.path().join("b.two-2.0.0.vsix"), "x").unwrap();

        let report = scan(root.path(), true).await.unwrap();

        let ids: Vec<&str> = report
            .extensions
            .iter()
            .map(|e| e.metadata.identity.id.as_str())
            .collect();
        assert_eq!(ids, vec!["a.one", "b.two"]);
        assert!(report.unrecorded.is_empty());
        assert_eq!(report.corrupt, vec![root.path().join("c.three.json")]);
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty_report() {
        let root = TempDir::new().unwrap();
        let report = scan(&root.path().join("nope"), false).await.unwrap();
        assert_eq!(report, InventoryReport::default());
        assert!(report.is_consistent());
    }
}
