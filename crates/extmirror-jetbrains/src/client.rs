//! Plugin repository client implementing the [`ExtensionSource`] port.

use std::collections::HashMap;

use async_trait::async_trait;
use futures_util::{StreamExt, stream};
use tracing::{debug, info, warn};
use url::Url;

use extmirror_core::{
    DownloadError, ExtensionIdentity, ExtensionRecord, ExtensionSource, FileName, VersionRecord,
};

use crate::build::{BuildNumber, is_compatible};
use crate::config::PluginRepositoryConfig;
use crate::error::{RepositoryError, RepositoryResult};
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::{PluginEntry, parse_plugin_list};
use crate::naming::plugin_file_name;
use crate::parsing::to_record;

// ============================================================================
// Type Aliases
// ============================================================================

/// Default repository client using the reqwest HTTP backend.
pub type DefaultPluginRepositoryClient = PluginRepositoryClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the JetBrains plugin repository.
///
/// The repository has no batch endpoint, so each identifier is listed with
/// its own request; at most `concurrency` requests are in flight. With a
/// target build the repository is asked for compatible builds only, and
/// entries whose `since-build`/`until-build` window still excludes the
/// target are dropped.
pub struct PluginRepositoryClient<B: HttpBackend> {
    backend: B,
    list_url: Url,
    download_url: Url,
    target_build: Option<String>,
    concurrency: usize,
}

impl DefaultPluginRepositoryClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &PluginRepositoryConfig) -> Result<Self, DownloadError> {
        let backend = ReqwestBackend::new(config)?;
        Ok(Self::with_backend(config, backend)?)
    }
}

impl<B: HttpBackend> PluginRepositoryClient<B> {
    pub(crate) fn with_backend(config: &PluginRepositoryConfig, backend: B) -> RepositoryResult<Self> {
        let mut server = Url::parse(&config.server_url)?;
        if !server.path().ends_with('/') {
            let path = format!("{}/", server.path());
            server.set_path(&path);
        }
        Ok(Self {
            backend,
            list_url: server.join("plugins/list")?,
            download_url: server.join("plugin/download")?,
            target_build: config
                .target_build
                .as_deref()
                .map(str::trim)
                .filter(|b| !b.is_empty())
                .map(ToString::to_string),
            concurrency: config.concurrency.max(1),
        })
    }

    fn list_request(&self, plugin_id: &str) -> Url {
        let mut url = self.list_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pluginId", plugin_id);
            if let Some(ref build) = self.target_build {
                query.append_pair("build", build);
            }
        }
        url
    }

    /// Entries for `plugin_id`; an unknown plugin yields an empty list.
    async fn list(&self, plugin_id: &str) -> RepositoryResult<Vec<PluginEntry>> {
        match self.backend.get_text(&self.list_request(plugin_id)).await {
            Ok(xml) => parse_plugin_list(&xml),
            Err(RepositoryError::ApiRequestFailed { status: 404, .. }) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    fn compatible(&self, entries: Vec<PluginEntry>) -> Vec<PluginEntry> {
        let Some(raw) = self.target_build.as_deref() else {
            return entries;
        };
        let Some(build) = BuildNumber::parse(raw) else {
            warn!(build = raw, "Unparseable target build, not filtering by build range");
            return entries;
        };
        entries
            .into_iter()
            .filter(|e| {
                let ok = is_compatible(e.since_build.as_deref(), e.until_build.as_deref(), &build);
                if !ok {
                    debug!(plugin = %e.id, version = %e.version, build = raw, "Build range excludes target");
                }
                ok
            })
            .collect()
    }
}

#[async_trait]
impl<B: HttpBackend> ExtensionSource for PluginRepositoryClient<B> {
    fn name(&self) -> &str {
        "jetbrains-plugins"
    }

    async fn fetch_extensions(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ExtensionRecord>, DownloadError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        info!(count = ids.len(), build = ?self.target_build, "Listing plugins");
        let requests: Vec<_> = ids
            .iter()
            .map(|id| async move { (id, self.list(id).await) })
            .collect();
        let listed: Vec<(&String, RepositoryResult<Vec<PluginEntry>>)> = stream::iter(requests)
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut records = HashMap::with_capacity(ids.len());
        for (asked, result) in listed {
            let entries: Vec<PluginEntry> = result?
                .into_iter()
                .filter(|e| e.id.eq_ignore_ascii_case(asked))
                .collect();
            let entries = self.compatible(entries);
            match to_record(&entries, &self.download_url) {
                Some(record) => {
                    records.insert(asked.clone(), record);
                }
                None => debug!(plugin = %asked, "No plugin entry returned"),
            }
        }

        debug!(found = records.len(), requested = ids.len(), "Plugin listing complete");
        Ok(records)
    }

    fn artifact_file_name(&self, extension: &ExtensionIdentity, version: &VersionRecord) -> FileName {
        plugin_file_name(extension, version)
    }
}
