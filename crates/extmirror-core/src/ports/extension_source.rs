//! Extension source port.

use std::collections::HashMap;

use async_trait::async_trait;

use super::naming::{FileName, artifact_stem, full_extension};
use crate::domain::{ExtensionIdentity, ExtensionRecord, VersionRecord};
use crate::error::DownloadError;

/// A marketplace that can describe extensions and their versions.
///
/// Implementations handle the specifics of each marketplace's API. The
/// pipeline calls [`fetch_extensions`](Self::fetch_extensions) exactly once
/// per batch with every requested identifier.
#[async_trait]
pub trait ExtensionSource: Send + Sync {
    /// Short marketplace name used in logs.
    fn name(&self) -> &str;

    /// Fetch records for a set of identifiers in one batched request.
    ///
    /// The returned map is keyed by identifier; identifiers unknown upstream
    /// are simply absent. Transport failures are returned as errors and are
    /// not retried by the caller.
    async fn fetch_extensions(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, ExtensionRecord>, DownloadError>;

    /// File name to store a version's artifact under.
    ///
    /// The default keeps the file extension the server suggests, so the name
    /// is only known once the response arrives.
    fn artifact_file_name(&self, extension: &ExtensionIdentity, version: &VersionRecord) -> FileName {
        let stem = artifact_stem(extension, version);
        FileName::resolver(move |suggested| {
            suggested.map(|s| format!("{stem}{}", full_extension(s)))
        })
    }
}
