//! Conversion of gallery wire types into core records.
//!
//! Versions the pipeline cannot use are dropped here rather than failing
//! the whole extension: a missing package asset or an unknown platform tag
//! only removes that one version.

use chrono::{DateTime, Utc};
use extmirror_core::{ExtensionIdentity, ExtensionRecord, TargetPlatform, VersionRecord};
use tracing::debug;

use crate::models::{
    DEPENDENCIES_PROPERTY, ENGINE_PROPERTY, GalleryExtension, GalleryVersion, PRERELEASE_PROPERTY,
    VSIX_ASSET_TYPE,
};

/// Convert one gallery extension into an [`ExtensionRecord`].
pub fn parse_extension(extension: &GalleryExtension) -> ExtensionRecord {
    let id = extension.unified_id();
    let identity = ExtensionIdentity {
        id: id.clone(),
        display_name: extension.display_name.clone(),
        publisher: extension.publisher.display_name.clone(),
        description: extension.short_description.clone(),
        categories: extension.categories.clone(),
    };

    let versions = extension
        .versions
        .iter()
        .filter_map(|v| parse_version(&id, v))
        .collect();

    ExtensionRecord { identity, versions }
}

/// Convert one gallery version, or `None` when it cannot be downloaded.
pub fn parse_version(ext_id: &str, version: &GalleryVersion) -> Option<VersionRecord> {
    let Some(url) = version.file_source(VSIX_ASSET_TYPE) else {
        debug!(ext_id, version = %version.version, "Version has no package asset, skipping");
        return None;
    };

    let platform = match version.target_platform.as_deref() {
        None => TargetPlatform::Universal,
        Some(tag) => match tag.parse::<TargetPlatform>() {
            Ok(platform) => platform,
            Err(e) => {
                debug!(ext_id, version = %version.version, error = %e, "Skipping unknown platform");
                return None;
            }
        },
    };

    let mut record = VersionRecord::new(&version.version, url)
        .with_platform(platform)
        .with_prerelease(is_prerelease(version));

    if let Some(at) = version.last_updated.as_deref().and_then(parse_timestamp) {
        record = record.with_last_updated(at);
    }
    if let Some(engine) = version.property(ENGINE_PROPERTY).filter(|e| !e.trim().is_empty()) {
        record = record.with_engine(engine.trim());
    }
    record.dependencies = version
        .property(DEPENDENCIES_PROPERTY)
        .map(parse_dependencies)
        .unwrap_or_default();

    Some(record)
}

/// Any non-empty `PreRelease` value marks a pre-release, except an
/// explicit `false`.
fn is_prerelease(version: &GalleryVersion) -> bool {
    version.property(PRERELEASE_PROPERTY).is_some_and(|v| {
        let v = v.trim();
        !v.is_empty() && !v.eq_ignore_ascii_case("false")
    })
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn parse_dependencies(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(ToString::to_string)
        .collect()
}
