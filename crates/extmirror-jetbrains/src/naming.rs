//! Artifact names for plugin downloads.
//!
//! The repository serves every plugin from the same `/plugin/download`
//! endpoint, and the archive type (`.zip` or `.jar`) is only known from the
//! response. Names are therefore resolved once the server has suggested one.

use extmirror_core::{ExtensionIdentity, FileName, VersionRecord, full_extension};
use sha2::{Digest, Sha256};

/// Resolver naming `{name}_{version}_{hash}{ext}`.
///
/// `name` is the lowercased display name (or the id) with whitespace runs
/// replaced by `-`. `hash` is the first 8 hex digits of the SHA-256 of
/// `{name}_{version}-{since}-{until}`, so two builds of one version for
/// different IDE ranges never collide. `ext` is the full extension of the
/// server-suggested name.
pub fn plugin_file_name(extension: &ExtensionIdentity, version: &VersionRecord) -> FileName {
    let stem = plugin_stem(extension, version);
    FileName::resolver(move |suggested| suggested.map(|s| format!("{stem}{}", full_extension(s))))
}

fn plugin_stem(extension: &ExtensionIdentity, version: &VersionRecord) -> String {
    let display = if extension.display_name.trim().is_empty() {
        &extension.id
    } else {
        &extension.display_name
    };
    let name = display
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-");
    let prefix = format!("{name}_{}", version.version);

    let range = format!(
        "{prefix}-{}-{}",
        version.since_build.as_deref().unwrap_or_default(),
        version.until_build.as_deref().unwrap_or_default()
    );
    let digest = format!("{:x}", Sha256::digest(range.as_bytes()));
    format!("{prefix}_{}", &digest[..8])
}
