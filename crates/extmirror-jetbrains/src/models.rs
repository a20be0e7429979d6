//! Plugin list documents.
//!
//! `GET /plugins/list?pluginId=..` answers with a `<plugin-repository>`
//! whose `<category>` children hold one `<idea-plugin>` per matching
//! plugin build:
//!
//! ```xml
//! <plugin-repository>
//!   <category name="Editor">
//!     <idea-plugin size="2375040" updatedDate="1712822400000">
//!       <name>IdeaVim</name>
//!       <id>IdeaVIM</id>
//!       <version>2.10.2</version>
//!       <vendor>JetBrains</vendor>
//!       <idea-version since-build="233.11799" until-build="241.*"/>
//!       <depends>com.intellij.modules.platform</depends>
//!     </idea-plugin>
//!   </category>
//! </plugin-repository>
//! ```

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};
use tracing::debug;

use crate::error::RepositoryResult;

/// One `<idea-plugin>` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginEntry {
    pub id: String,
    pub name: String,
    pub description: String,
    pub vendor: String,
    pub category: String,
    pub tags: Vec<String>,
    pub version: String,
    pub size: Option<u64>,
    pub updated: Option<DateTime<Utc>>,
    pub since_build: Option<String>,
    pub until_build: Option<String>,
    pub depends: Vec<String>,
}

/// Parse a plugin list document.
///
/// Entries without an id or a version are skipped.
pub fn parse_plugin_list(xml: &str) -> RepositoryResult<Vec<PluginEntry>> {
    let document = Document::parse(xml)?;
    let mut entries = Vec::new();

    for category in document
        .root_element()
        .children()
        .filter(|n| n.has_tag_name("category"))
    {
        let category_name = category.attribute("name").unwrap_or_default();
        for plugin in category.children().filter(|n| n.has_tag_name("idea-plugin")) {
            match parse_entry(plugin, category_name) {
                Some(entry) => entries.push(entry),
                None => debug!("Skipping plugin entry without id or version"),
            }
        }
    }
    Ok(entries)
}

fn parse_entry(plugin: Node<'_, '_>, category: &str) -> Option<PluginEntry> {
    let id = child_text(plugin, "id").filter(|s| !s.is_empty())?;
    let version = child_text(plugin, "version").filter(|s| !s.is_empty())?;
    let idea_version = plugin.children().find(|n| n.has_tag_name("idea-version"));
    let bound = |attr: &str| {
        idea_version
            .and_then(|n| n.attribute(attr))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
    };

    Some(PluginEntry {
        id,
        version,
        name: child_text(plugin, "name").unwrap_or_default(),
        description: child_text(plugin, "description").unwrap_or_default(),
        vendor: child_text(plugin, "vendor").unwrap_or_default(),
        category: category.to_string(),
        tags: children_text(plugin, "tags"),
        size: plugin.attribute("size").and_then(|s| s.trim().parse().ok()),
        updated: plugin
            .attribute("updatedDate")
            .and_then(|s| s.trim().parse::<i64>().ok())
            .and_then(DateTime::from_timestamp_millis),
        since_build: bound("since-build"),
        until_build: bound("until-build"),
        depends: children_text(plugin, "depends"),
    })
}

/// Trimmed text of the first `tag` child; empty when the child has no text.
fn child_text(node: Node<'_, '_>, tag: &str) -> Option<String> {
    node.children()
        .find(|n| n.has_tag_name(tag))
        .map(|n| n.text().unwrap_or_default().trim().to_string())
}

/// Trimmed, non-empty texts of every `tag` child.
fn children_text(node: Node<'_, '_>, tag: &str) -> Vec<String> {
    node.children()
        .filter(|n| n.has_tag_name(tag))
        .filter_map(|n| n.text())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}
