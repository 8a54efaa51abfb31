//! Installed toolchain inventory.
//!
//! Toolchains are installed under `<toolchain_root>/<platform>/<version>/`
//! (e.g. `/opt/nodejs/10.14.2`). The inventory is scanned once per
//! invocation into an immutable snapshot; concurrent builds each take their
//! own snapshot, so there is no shared cache to invalidate.

use crate::versions::PlatformVersion;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct ToolchainInventory {
    root: PathBuf,
    versions: BTreeMap<String, Vec<PlatformVersion>>,
}

impl ToolchainInventory {
    /// Scan installed versions for the given platforms. A platform with no
    /// directory simply has an empty version list; resolution against it
    /// fails with `UnsupportedVersion`, not an I/O error.
    pub fn scan(toolchain_root: &Path, platform_ids: &[&str]) -> Self {
        let mut versions = BTreeMap::new();
        for id in platform_ids {
            let mut installed = Vec::new();
            let platform_dir = toolchain_root.join(id);
            if let Ok(entries) = std::fs::read_dir(&platform_dir) {
                for entry in entries.flatten() {
                    if !entry.path().is_dir() {
                        continue;
                    }
                    let name = entry.file_name().to_string_lossy().to_string();
                    match PlatformVersion::parse(&name) {
                        Some(version) => installed.push(version),
                        None => {
                            debug!(platform = id, dir = %name, "ignoring non-version directory")
                        }
                    }
                }
            }
            installed.sort();
            versions.insert(id.to_string(), installed);
        }
        debug!(root = %toolchain_root.display(), "scanned toolchain inventory");
        Self {
            root: toolchain_root.to_path_buf(),
            versions,
        }
    }

    /// Build an inventory from explicit entries. Used by tests and by
    /// callers that already know what is installed.
    pub fn with_versions(toolchain_root: &Path, entries: &[(&str, &[&str])]) -> Self {
        let mut versions = BTreeMap::new();
        for (platform, raws) in entries {
            let mut installed: Vec<PlatformVersion> = raws
                .iter()
                .filter_map(|raw| PlatformVersion::parse(raw))
                .collect();
            installed.sort();
            versions.insert(platform.to_string(), installed);
        }
        Self {
            root: toolchain_root.to_path_buf(),
            versions,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn versions(&self, platform: &str) -> &[PlatformVersion] {
        self.versions
            .get(platform)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Absolute installation directory for a resolved platform version.
    pub fn install_dir(&self, platform: &str, version: &str) -> PathBuf {
        self.root.join(platform).join(version)
    }

    pub fn platform_ids(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(|k| k.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scan_reads_version_directories() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nodejs/8.11.4")).unwrap();
        fs::create_dir_all(dir.path().join("nodejs/10.14.2")).unwrap();
        fs::create_dir_all(dir.path().join("python/3.7.3")).unwrap();

        let inventory = ToolchainInventory::scan(dir.path(), &["nodejs", "python", "php"]);
        let node: Vec<&str> = inventory
            .versions("nodejs")
            .iter()
            .map(|v| v.raw.as_str())
            .collect();
        assert_eq!(node, vec!["8.11.4", "10.14.2"]);
        assert_eq!(inventory.versions("python").len(), 1);
        assert!(inventory.versions("php").is_empty());
    }

    #[test]
    fn test_scan_skips_non_version_entries() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("nodejs/10.14.2")).unwrap();
        fs::create_dir_all(dir.path().join("nodejs/latest-lts")).unwrap();
        fs::write(dir.path().join("nodejs/README"), "x").unwrap();

        let inventory = ToolchainInventory::scan(dir.path(), &["nodejs"]);
        assert_eq!(inventory.versions("nodejs").len(), 1);
    }

    #[test]
    fn test_unknown_platform_is_empty() {
        let dir = TempDir::new().unwrap();
        let inventory = ToolchainInventory::scan(dir.path(), &["nodejs"]);
        assert!(inventory.versions("cobol").is_empty());
    }

    #[test]
    fn test_install_dir_layout() {
        let inventory =
            ToolchainInventory::with_versions(Path::new("/opt"), &[("nodejs", &["10.14.2"])]);
        assert_eq!(
            inventory.install_dir("nodejs", "10.14.2"),
            PathBuf::from("/opt/nodejs/10.14.2")
        );
    }

    #[test]
    fn test_with_versions_sorts_numerically() {
        let inventory = ToolchainInventory::with_versions(
            Path::new("/opt"),
            &[("nodejs", &["10.14.2", "8.11.4", "9.4.0"])],
        );
        let raws: Vec<&str> = inventory
            .versions("nodejs")
            .iter()
            .map(|v| v.raw.as_str())
            .collect();
        assert_eq!(raws, vec!["8.11.4", "9.4.0", "10.14.2"]);
    }
}
