//! Wire types for the gallery `extensionquery` endpoint.
//!
//! These mirror the JSON exactly and stay private to the crate; parsing
//! turns them into core records.

use serde::{Deserialize, Serialize};

/// Asset type of the installable package.
pub const VSIX_ASSET_TYPE: &str = "Microsoft.VisualStudio.Services.VSIXPackage";
/// Version property holding the supported editor engine range.
pub const ENGINE_PROPERTY: &str = "Microsoft.VisualStudio.Code.Engine";
/// Version property marking pre-release builds.
pub const PRERELEASE_PROPERTY: &str = "Microsoft.VisualStudio.Code.PreRelease";
/// Version property listing extension dependencies, comma separated.
pub const DEPENDENCIES_PROPERTY: &str = "Microsoft.VisualStudio.Code.ExtensionDependencies";

/// Filter type for looking an extension up by `publisher.name`.
const FILTER_BY_NAME: u32 = 7;
/// Include versions, files, categories, version properties, asset URIs
/// and platform tags.
const QUERY_FLAGS: u32 = 439;

// ============================================================================
// Request
// ============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub asset_types: Vec<String>,
    pub filters: Vec<QueryFilter>,
    pub flags: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryFilter {
    pub criteria: Vec<Criterion>,
    pub page_size: usize,
    pub page_number: usize,
    pub sort_by: u32,
    pub sort_order: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Criterion {
    pub filter_type: u32,
    pub value: String,
}

impl QueryRequest {
    /// A single-page query for every id in `ids`.
    pub fn by_names(ids: &[String]) -> Self {
        Self {
            asset_types: vec![VSIX_ASSET_TYPE.to_string()],
            filters: vec![QueryFilter {
                criteria: ids
                    .iter()
                    .map(|id| Criterion {
                        filter_type: FILTER_BY_NAME,
                        value: id.clone(),
                    })
                    .collect(),
                page_size: ids.len(),
                page_number: 1,
                sort_by: 0,
                sort_order: 0,
            }],
            flags: QUERY_FLAGS,
        }
    }
}

// ============================================================================
// Response
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Vec<QueryResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryResult {
    #[serde(default)]
    pub extensions: Vec<GalleryExtension>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryExtension {
    pub publisher: GalleryPublisher,
    pub extension_name: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub versions: Vec<GalleryVersion>,
}

impl GalleryExtension {
    /// Unified `publisher.name` identifier.
    pub fn unified_id(&self) -> String {
        format!("{}.{}", self.publisher.publisher_name, self.extension_name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryPublisher {
    pub publisher_name: String,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryVersion {
    pub version: String,
    #[serde(default)]
    pub target_platform: Option<String>,
    #[serde(default)]
    pub last_updated: Option<String>,
    #[serde(default)]
    pub files: Vec<GalleryFile>,
    #[serde(default)]
    pub properties: Vec<GalleryProperty>,
}

impl GalleryVersion {
    pub fn file_source(&self, asset_type: &str) -> Option<&str> {
        self.files
            .iter()
            .find(|f| f.asset_type == asset_type)
            .map(|f| f.source.as_str())
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryFile {
    pub asset_type: String,
    pub source: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GalleryProperty {
    pub key: String,
    #[serde(default)]
    pub value: String,
}
