//! Extension, version and sidecar records.
//!
//! Pure data types with no I/O dependencies. Records produced by a fetch
//! collaborator are treated as immutable values; the sidecar is the
//! persisted per-extension history of downloaded versions.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::platform::TargetPlatform;
use super::version::compare_versions;
use crate::error::DownloadError;

/// Identity fields shared by an extension record and its sidecar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionIdentity {
    /// Unified identifier (e.g. `publisher.name`).
    pub id: String,
    /// Human-readable name.
    #[serde(default)]
    pub display_name: String,
    /// Publisher display name.
    #[serde(default)]
    pub publisher: String,
    /// Short description.
    #[serde(default)]
    pub description: String,
    /// Categories or tags.
    #[serde(default)]
    pub categories: Vec<String>,
}

impl ExtensionIdentity {
    /// Create an identity with only the identifier set.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: String::new(),
            publisher: String::new(),
            description: String::new(),
            categories: Vec::new(),
        }
    }
}

/// A single published version of an extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    /// Version string as published.
    pub version: String,
    /// Platform this build targets.
    #[serde(default)]
    pub target_platform: TargetPlatform,
    /// Whether the marketplace flags this version as a pre-release.
    #[serde(default)]
    pub prerelease: bool,
    /// Last time the version was updated upstream.
    #[serde(default)]
    pub last_updated: Option<DateTime<Utc>>,
    /// Where the package artifact can be downloaded.
    pub download_url: String,
    /// Artifact size in bytes, when advertised.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// Engine/host compatibility constraint (e.g. `^1.75.0`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    /// Oldest IDE build the version installs on (`since-build`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub since_build: Option<String>,
    /// Newest IDE build the version installs on (`until-build`, may hold `*`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until_build: Option<String>,
    /// Identifiers of extensions this version depends on.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

impl VersionRecord {
    /// Create a universal, released version record.
    pub fn new(version: impl Into<String>, download_url: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            target_platform: TargetPlatform::Universal,
            prerelease: false,
            last_updated: None,
            download_url: download_url.into(),
            size: None,
            engine: None,
            since_build: None,
            until_build: None,
            dependencies: Vec::new(),
        }
    }

    /// Set the target platform.
    #[must_use]
    pub const fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.target_platform = platform;
        self
    }

    /// Mark the version as a pre-release.
    #[must_use]
    pub const fn with_prerelease(mut self, prerelease: bool) -> Self {
        self.prerelease = prerelease;
        self
    }

    /// Set the last-updated timestamp.
    #[must_use]
    pub const fn with_last_updated(mut self, at: DateTime<Utc>) -> Self {
        self.last_updated = Some(at);
        self
    }

    /// Set the engine constraint.
    #[must_use]
    pub fn with_engine(mut self, engine: impl Into<String>) -> Self {
        self.engine = Some(engine.into());
        self
    }

    /// Set the IDE build range.
    #[must_use]
    pub fn with_build_range(mut self, since: Option<String>, until: Option<String>) -> Self {
        self.since_build = since;
        self.until_build = until;
        self
    }

    /// Whether two records describe the same (version, platform) pair.
    #[must_use]
    pub fn same_build(&self, other: &Self) -> bool {
        self.version == other.version && self.target_platform == other.target_platform
    }

    /// Total precedence order.
    ///
    /// Version precedence first, then a release outranks a pre-release of
    /// the same version, then the most recently updated wins. Platform and
    /// URL only break remaining ties so the order is total.
    #[must_use]
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        compare_versions(&self.version, &other.version)
            .then_with(|| other.prerelease.cmp(&self.prerelease))
            .then_with(|| self.last_updated.cmp(&other.last_updated))
            .then_with(|| self.target_platform.cmp(&other.target_platform))
            .then_with(|| self.download_url.cmp(&other.download_url))
    }
}

/// An extension and the versions the marketplace currently offers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionRecord {
    #[serde(flatten)]
    pub identity: ExtensionIdentity,
    /// Available versions in marketplace order.
    pub versions: Vec<VersionRecord>,
}

impl ExtensionRecord {
    /// Unified identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.identity.id
    }
}

/// A version that has been downloaded, with its artifact file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadedVersionRecord {
    #[serde(flatten)]
    pub version: VersionRecord,
    /// Artifact file name relative to the extension directory.
    pub file_name: String,
}

impl DownloadedVersionRecord {
    /// Pair a version with the artifact it was stored as.
    pub fn new(version: VersionRecord, file_name: impl Into<String>) -> Self {
        Self {
            version,
            file_name: file_name.into(),
        }
    }

    /// See [`VersionRecord::cmp_precedence`].
    #[must_use]
    pub fn cmp_precedence(&self, other: &Self) -> Ordering {
        self.version.cmp_precedence(&other.version)
    }
}

/// Persisted per-extension document describing downloaded versions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSidecar {
    #[serde(flatten)]
    pub identity: ExtensionIdentity,
    /// Downloaded versions, highest precedence first.
    pub versions: Vec<DownloadedVersionRecord>,
}

impl MetadataSidecar {
    /// Start an empty sidecar for an extension.
    #[must_use]
    pub const fn new(identity: ExtensionIdentity) -> Self {
        Self {
            identity,
            versions: Vec::new(),
        }
    }

    /// Sort versions by precedence, highest first.
    pub fn sort_versions(&mut self) {
        self.versions.sort_by(|a, b| b.cmp_precedence(a));
    }

    /// Serialize as pretty-printed JSON with 2-space indentation.
    pub fn to_json(&self) -> Result<String, DownloadError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| DownloadError::other(format!("failed to serialize sidecar: {e}")))
    }

    /// Parse a sidecar document. `source` names the document in errors.
    pub fn from_json(source: &str, json: &str) -> Result<Self, DownloadError> {
        serde_json::from_str(json).map_err(|e| DownloadError::parse(source, e.to_string()))
    }
}
