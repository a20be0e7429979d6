//! Artifact file naming.

use std::fmt;
use std::sync::Arc;

use crate::domain::{ExtensionIdentity, VersionRecord};

/// How the final file name of a downloaded artifact is determined.
#[derive(Clone)]
pub enum FileName {
    /// A name known before any network call.
    Literal(String),
    /// Derive the name from the server-suggested one (Content-Disposition or
    /// last URL segment), which may be absent.
    Resolver(Arc<dyn Fn(Option<&str>) -> Option<String> + Send + Sync>),
}

impl FileName {
    /// Wrap a resolver function.
    pub fn resolver<F>(f: F) -> Self
    where
        F: Fn(Option<&str>) -> Option<String> + Send + Sync + 'static,
    {
        Self::Resolver(Arc::new(f))
    }

    /// The name if it is known without contacting the server.
    #[must_use]
    pub fn known(&self) -> Option<&str> {
        match self {
            Self::Literal(name) => Some(name.trim()).filter(|n| !n.is_empty()),
            Self::Resolver(_) => None,
        }
    }

    /// Resolve the final name, given what the server suggested.
    ///
    /// Returns `None` when no non-empty name can be determined.
    #[must_use]
    pub fn resolve(&self, suggested: Option<&str>) -> Option<String> {
        let name = match self {
            Self::Literal(name) => Some(name.clone()),
            Self::Resolver(f) => f(suggested),
        };
        name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
    }
}

impl fmt::Debug for FileName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(name) => f.debug_tuple("Literal").field(name).finish(),
            Self::Resolver(_) => f.write_str("Resolver(..)"),
        }
    }
}

/// Deterministic artifact stem: `{id}-{version}` plus `@{platform}` for
/// platform-specific builds.
pub fn artifact_stem(extension: &ExtensionIdentity, version: &VersionRecord) -> String {
    if version.target_platform.is_universal() {
        format!("{}-{}", extension.id, version.version)
    } else {
        format!(
            "{}-{}@{}",
            extension.id, version.version, version.target_platform
        )
    }
}

/// Full (possibly multi-part) extension of a file name, including the dot.
///
/// `plugin.tar.gz` yields `.tar.gz`; a name without a dot yields `""`.
/// Parts that contain anything but ASCII alphanumerics stop the scan, so
/// version-like names (`tool-1.2.3.zip`) yield `.zip`.
pub fn full_extension(name: &str) -> String {
    let parts: Vec<&str> = name.split('.').collect();
    if parts.len() < 2 {
        return String::new();
    }
    let suffixes: Vec<&str> = parts[1..]
        .iter()
        .rev()
        .take_while(|p| {
            !p.is_empty()
                && p.chars().all(|c| c.is_ascii_alphanumeric())
                && p.chars().any(|c| c.is_ascii_alphabetic())
        })
        .copied()
        .collect();
    suffixes
        .iter()
        .rev()
        .fold(String::new(), |mut acc, s| {
            acc.push('.');
            acc.push_str(s);
            acc
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::TargetPlatform;

    #[test]
    fn test_literal_name_is_known_up_front() {
        let name = FileName::Literal(" a.vsix ".into());
        assert_eq!(name.known(), Some("a.vsix"));
        assert_eq!(name.resolve(Some("ignored.zip")), Some("a.vsix".into()));
    }

    #[test]
    fn test_resolver_uses_suggested_name() {
        let name = FileName::resolver(|s| s.map(|s| format!("x{}", full_extension(s))));
        assert_eq!(name.known(), None);
        assert_eq!(name.resolve(Some("plugin.tar.gz")), Some("x.tar.gz".into()));
        assert_eq!(name.resolve(None), None);
    }

    #[test]
    fn test_blank_names_do_not_resolve() {
        assert_eq!(FileName::Literal("  ".into()).resolve(None), None);
        assert_eq!(FileName::Literal("  ".into()).known(), None);
    }

    #[test]
    fn test_full_extension() {
        assert_eq!(full_extension("plugin.tar.gz"), ".tar.gz");
        assert_eq!(full_extension("tool-1.2.3.zip"), ".zip");
        assert_eq!(full_extension("tool.jar"), ".jar");
        assert_eq!(full_extension("README"), "");
    }

    #[test]
    fn test_artifact_stem_includes_non_universal_platform() {
        let ext = ExtensionIdentity::new("ms-python.python");
        let universal = VersionRecord::new("2024.1.0", "u");
        let win = universal.clone().with_platform(TargetPlatform::Win32X64);

        assert_eq!(artifact_stem(&ext, &universal), "ms-python.python-2024.1.0");
        assert_eq!(
            artifact_stem(&ext, &win),
            "ms-python.python-2024.1.0@win32-x64"
        );
    }
}
