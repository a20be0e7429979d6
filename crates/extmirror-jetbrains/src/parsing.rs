//! Conversion of plugin list entries into core records.

use extmirror_core::{ExtensionIdentity, ExtensionRecord, VersionRecord};
use url::Url;

use crate::models::PluginEntry;

/// Merge the entries of one plugin into an [`ExtensionRecord`].
///
/// Identity fields come from the first entry. The category leads the
/// category list, followed by the tags.
pub fn to_record(entries: &[PluginEntry], download_base: &Url) -> Option<ExtensionRecord> {
    let first = entries.first()?;

    let mut categories = Vec::with_capacity(first.tags.len() + 1);
    if !first.category.is_empty() {
        categories.push(first.category.clone());
    }
    for tag in &first.tags {
        if !categories.contains(tag) {
            categories.push(tag.clone());
        }
    }

    let identity = ExtensionIdentity {
        id: first.id.clone(),
        display_name: first.name.clone(),
        publisher: first.vendor.clone(),
        description: first.description.clone(),
        categories,
    };
    let versions = entries
        .iter()
        .map(|entry| to_version(entry, download_base))
        .collect();

    Some(ExtensionRecord { identity, versions })
}

fn to_version(entry: &PluginEntry, download_base: &Url) -> VersionRecord {
    let mut record = VersionRecord::new(&entry.version, download_url(download_base, entry))
        .with_build_range(entry.since_build.clone(), entry.until_build.clone());
    if let Some(at) = entry.updated {
        record = record.with_last_updated(at);
    }
    record.size = entry.size;
    record.dependencies.clone_from(&entry.depends);
    record
}

/// `{base}?pluginId={id}&version={version}`.
fn download_url(base: &Url, entry: &PluginEntry) -> String {
    let mut url = base.clone();
    url.query_pairs_mut()
        .append_pair("pluginId", &entry.id)
        .append_pair("version", &entry.version);
    url.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use extmirror_core::TargetPlatform;

    fn entry(version: &str) -> PluginEntry {
        PluginEntry {
            id: "org.rust.lang".into(),
            name: "Rust".into(),
            description: "Rust support".into(),
            vendor: "JetBrains".into(),
            category: "Languages".into(),
            tags: vec!["Rust".into(), "Languages".into()],
            version: version.into(),
            size: Some(10),
            updated: None,
            since_build: Some("241.1".into()),
            until_build: None,
            depends: vec!["com.intellij.modules.lang".into()],
        }
    }

    #[test]
    fn test_record_fields() {
        let base = Url::parse("https://repo.test/plugin/download").unwrap();
        let record = to_record(&[entry("0.4.200")], &base).unwrap();

        assert_eq!(record.id(), "org.rust.lang");
        assert_eq!(record.identity.publisher, "JetBrains");
        assert_eq!(record.identity.categories, vec!["Languages", "Rust"]);

        let version = &record.versions[0];
        assert_eq!(version.target_platform, TargetPlatform::Universal);
        assert_eq!(version.since_build.as_deref(), Some("241.1"));
        assert_eq!(version.size, Some(10));
        assert_eq!(version.dependencies, vec!["com.intellij.modules.lang"]);
        assert_eq!(
            version.download_url,
            "https://repo.test/plugin/download?pluginId=org.rust.lang&version=0.4.200"
        );
    }

    #[test]
    fn test_no_entries_no_record() {
        let base = Url::parse("https://repo.test/plugin/download").unwrap();
        assert!(to_record(&[], &base).is_none());
    }
}
