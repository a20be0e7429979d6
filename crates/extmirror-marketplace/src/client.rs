//! Gallery client implementing the [`ExtensionSource`] port.

use std::collections::HashMap;

use async_trait::async_trait;
use extmirror_core::{
    DownloadError, ExtensionIdentity, ExtensionRecord, ExtensionSource, FileName, VersionRecord,
    artifact_stem,
};
use tracing::{debug, info};
use url::Url;

use crate::config::GalleryClientConfig;
use crate::error::MarketplaceResult;
use crate::http::{HttpBackend, ReqwestBackend};
use crate::models::{QueryRequest, QueryResponse};
use crate::parsing::parse_extension;

// ============================================================================
// Type Aliases
// ============================================================================

/// Default gallery client using the reqwest HTTP backend.
pub type DefaultGalleryClient = GalleryClient<ReqwestBackend>;

// ============================================================================
// Client
// ============================================================================

/// Client for the VS Code marketplace gallery.
///
/// Generic over an HTTP backend so tests can inject canned replies. Use
/// [`DefaultGalleryClient`] in production code.
pub struct GalleryClient<B: HttpBackend> {
    backend: B,
    query_url: Url,
}

impl DefaultGalleryClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &GalleryClientConfig) -> Result<Self, DownloadError> {
        let query_url = Url::parse(&config.query_url).map_err(crate::MarketplaceError::from)?;
        let backend = ReqwestBackend::new(config)?;
        Ok(Self { backend, query_url })
    }
}

impl<B: HttpBackend> GalleryClient<B> {
    #[cfg(test)]
    pub(crate) const fn with_backend(query_url: Url, backend: B) -> Self {
        Self { backend, query_url }
    }

    async fn query(&self, ids: &[String]) -> MarketplaceResult<QueryResponse> {
        self.backend
            .post_json(&self.query_url, &QueryRequest::by_names(ids))
            .await
    }
}

#[async_trait]
impl<B: HttpBackend> ExtensionSource for GalleryClient<B> {
    fn name(&self) -> &str {
        "vscode-marketplace"
    }

    async fn fetch_extensions(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ExtensionRecord>, DownloadError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Answers come back in canonical case; key them by what was asked.
        let requested: HashMap<String, &String> = ids
            .iter()
            .map(|id| (id.to_ascii_lowercase(), id))
            .collect();

        info!(count = ids.len(), "Querying marketplace");
        let response = self.query(ids).await?;

        let mut records = HashMap::with_capacity(ids.len());
        for extension in response.results.iter().flat_map(|r| &r.extensions) {
            let unified = extension.unified_id();
            let Some(&asked) = requested.get(&unified.to_ascii_lowercase()) else {
                debug!(ext_id = %unified, "Ignoring extension that was not requested");
                continue;
            };
            records
                .entry(asked.clone())
                .or_insert_with(|| parse_extension(extension));
        }

        debug!(found = records.len(), requested = ids.len(), "Marketplace query complete");
        Ok(records)
    }

    fn artifact_file_name(&self, extension: &ExtensionIdentity, version: &VersionRecord) -> FileName {
        FileName::Literal(format!("{}.vsix", artifact_stem(extension, version)))
    }
}
