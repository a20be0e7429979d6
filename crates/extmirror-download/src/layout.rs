//! On-disk layout of a download directory.

use std::path::{Path, PathBuf};

/// Where artifacts and sidecars for each extension live.
///
/// Default: `{target}/{id}/`; flattened: everything directly in `{target}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionLayout {
    target_dir: PathBuf,
    flatten: bool,
}

impl ExtensionLayout {
    pub fn new(target_dir: impl Into<PathBuf>, flatten: bool) -> Self {
        Self {
            target_dir: target_dir.into(),
            flatten,
        }
    }

    #[must_use]
    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.flatten
    }

    /// Directory holding an extension's artifacts and sidecar.
    #[must_use]
    pub fn extension_dir(&self, ext_id: &str) -> PathBuf {
        if self.flatten {
            self.target_dir.clone()
        } else {
            self.target_dir.join(ext_id)
        }
    }

    /// Path of an extension's sidecar, `{dir}/{id}.json`.
    #[must_use]
    pub fn sidecar_path(&self, ext_id: &str) -> PathBuf {
        self.extension_dir(ext_id).join(format!("{ext_id}.json"))
    }
}

/// Whether an identifier is usable as a directory and file name stem.
pub fn is_safe_id(ext_id: &str) -> bool {
    !ext_id.is_empty()
        && ext_id != "."
        && ext_id != ".."
        && !ext_id.contains(['/', '\\'])
        && !ext_id.starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_layout() {
        let layout = ExtensionLayout::new("/mirror", false);
        assert_eq!(layout.extension_dir("acme.tool"), Path::new("/mirror/acme.tool"));
        assert_eq!(
            layout.sidecar_path("acme.tool"),
            Path::new("/mirror/acme.tool/acme.tool.json")
        );
    }

    #[test]
    fn test_flat_layout() {
        let layout = ExtensionLayout::new("/mirror", true);
        assert_eq!(layout.extension_dir("acme.tool"), Path::new("/mirror"));
        assert_eq!(layout.sidecar_path("acme.tool"), Path::new("/mirror/acme.tool.json"));
    }

    #[test]
    fn test_unsafe_ids() {
        assert!(is_safe_id("ms-python.python"));
        assert!(!is_safe_id("../etc"));
        assert!(!is_safe_id("a/b"));
        assert!(!is_safe_id(".hidden"));
        assert!(!is_safe_id(""));
    }
}
