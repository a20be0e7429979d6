//! Per-extension filter and download options, and the query/spec records
//! that carry them.

use serde::{Deserialize, Deserializer, Serialize};

use super::platform::TargetPlatform;

/// Criteria used to pick versions of an extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    /// Platforms to download. `None` accepts every platform.
    ///
    /// Accepts a single string or a list in JSON.
    #[serde(deserialize_with = "one_or_many")]
    pub target_platform: Option<Vec<TargetPlatform>>,
    /// Platform to fall back to when no requested platform has a match.
    pub target_platform_fallback: Option<TargetPlatform>,
    /// Host engine version versions must be compatible with.
    pub required_engine_version: Option<String>,
    /// Whether pre-release versions are eligible.
    pub include_prerelease: bool,
}

impl FilterOptions {
    /// Restrict to a single platform.
    #[must_use]
    pub fn with_platform(mut self, platform: TargetPlatform) -> Self {
        self.target_platform = Some(vec![platform]);
        self
    }

    /// Restrict to a set of platforms.
    #[must_use]
    pub fn with_platforms(mut self, platforms: impl IntoIterator<Item = TargetPlatform>) -> Self {
        self.target_platform = Some(platforms.into_iter().collect());
        self
    }

    /// Set the fallback platform.
    #[must_use]
    pub const fn with_fallback(mut self, platform: TargetPlatform) -> Self {
        self.target_platform_fallback = Some(platform);
        self
    }

    /// Require compatibility with an engine version.
    #[must_use]
    pub fn with_engine_version(mut self, version: impl Into<String>) -> Self {
        self.required_engine_version = Some(version.into());
        self
    }

    /// Allow pre-release versions.
    #[must_use]
    pub const fn with_prerelease(mut self, include: bool) -> Self {
        self.include_prerelease = include;
        self
    }

    /// Whether `platform` passes the platform filter.
    ///
    /// Universal builds are never excluded, and an empty or absent set
    /// accepts everything.
    #[must_use]
    pub fn accepts_platform(&self, platform: TargetPlatform) -> bool {
        if platform.is_universal() {
            return true;
        }
        match &self.target_platform {
            Some(set) if !set.is_empty() => set.contains(&platform),
            _ => true,
        }
    }
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Option<Vec<TargetPlatform>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(TargetPlatform),
        Many(Vec<TargetPlatform>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => None,
        Some(OneOrMany::One(p)) => Some(vec![p]),
        Some(OneOrMany::Many(v)) => Some(v),
    })
}

/// How an extension's artifacts and sidecar are written.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadOptions {
    /// Don't download again when the final artifact already exists.
    pub skip_if_exists: bool,
    /// Don't write a sidecar, and delete any existing one.
    pub no_metadata: bool,
    /// Store every extension's files in the target directory itself.
    pub flatten_dir: bool,
    /// After merging, delete artifacts of superseded versions.
    pub keep_only_latest: bool,
}

/// One entry of a download request: a bare identifier or an identifier
/// with option overrides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionQuery {
    /// Bare identifier using the run's default options.
    Id(String),
    /// Identifier with optional per-extension overrides.
    Custom {
        ext_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        download_options: Option<DownloadOptions>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filter_options: Option<FilterOptions>,
    },
}

impl ExtensionQuery {
    /// The identifier this query refers to.
    #[must_use]
    pub fn ext_id(&self) -> &str {
        match self {
            Self::Id(id) => id.trim(),
            Self::Custom { ext_id, .. } => ext_id.trim(),
        }
    }

    /// Resolve against run defaults into a fully specified entry.
    #[must_use]
    pub fn resolve(&self, download: DownloadOptions, filter: &FilterOptions) -> ExtensionSpec {
        match self {
            Self::Id(_) => ExtensionSpec {
                ext_id: self.ext_id().to_string(),
                download_options: download,
                filter_options: filter.clone(),
            },
            Self::Custom {
                download_options,
                filter_options,
                ..
            } => ExtensionSpec {
                ext_id: self.ext_id().to_string(),
                download_options: download_options.unwrap_or(download),
                filter_options: filter_options.clone().unwrap_or_else(|| filter.clone()),
            },
        }
    }
}

impl From<&str> for ExtensionQuery {
    fn from(id: &str) -> Self {
        Self::Id(id.to_string())
    }
}

impl From<ExtensionSpec> for ExtensionQuery {
    fn from(spec: ExtensionSpec) -> Self {
        Self::Custom {
            ext_id: spec.ext_id,
            download_options: Some(spec.download_options),
            filter_options: Some(spec.filter_options),
        }
    }
}

/// A fully resolved request entry, as written to a task spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionSpec {
    pub ext_id: String,
    pub download_options: DownloadOptions,
    pub filter_options: FilterOptions,
}
