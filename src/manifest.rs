//! Build manifest: the persisted record of a successful build.
//!
//! A flat key/value file (one `key = "value"` line per entry, valid TOML)
//! written under a fixed name in the output directory, so the later startup
//! resolver can skip re-detection. It is written only after the build script
//! succeeds, and always atomically: a rebuild replaces it whole, never
//! leaves a partial file.

use crate::error::BuildError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Well-known manifest file name inside the output directory.
pub const MANIFEST_FILENAME: &str = "forgebox-manifest.toml";

pub mod keys {
    pub const PLATFORM: &str = "platform";
    pub const VERSION: &str = "version";
    pub const SOURCE_PATH: &str = "source_path";
    pub const OUTPUT_PATH: &str = "output_path";
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BuildManifest {
    entries: BTreeMap<String, String>,
}

impl BuildManifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    pub fn extend(&mut self, entries: &BTreeMap<String, String>) {
        for (key, value) in entries {
            self.entries.insert(key.clone(), value.clone());
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(|v| v.as_str())
    }

    pub fn entries(&self) -> &BTreeMap<String, String> {
        &self.entries
    }

    /// One `key = "value"` line per entry, keys in sorted order.
    pub fn to_text(&self) -> String {
        toml::to_string(&self.entries).unwrap_or_default()
    }

    /// Write atomically to `<output_dir>/forgebox-manifest.toml`: the file
    /// is staged under a temporary name and renamed into place.
    pub fn write(&self, output_dir: &Path) -> Result<PathBuf, BuildError> {
        std::fs::create_dir_all(output_dir)?;
        let path = output_dir.join(MANIFEST_FILENAME);
        let staging = output_dir.join(format!("{}.tmp", MANIFEST_FILENAME));
        std::fs::write(&staging, self.to_text())?;
        std::fs::rename(&staging, &path)?;
        debug!(path = %path.display(), "wrote build manifest");
        Ok(path)
    }

    /// Read a previously written manifest. A missing or unparseable file is
    /// `Ok(None)`: the manifest is an optimization, and its consumers fall
    /// back to fresh detection.
    pub fn read(path: &Path) -> Result<Option<Self>, BuildError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        match toml::from_str::<BTreeMap<String, String>>(&content) {
            Ok(entries) => Ok(Some(Self { entries })),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "ignoring unparseable manifest");
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> BuildManifest {
        let mut manifest = BuildManifest::new();
        manifest.insert(keys::PLATFORM, "nodejs");
        manifest.insert(keys::VERSION, "10.14");
        manifest.insert(keys::SOURCE_PATH, "/src/app");
        manifest.insert(keys::OUTPUT_PATH, "/out/app");
        manifest
    }

    #[test]
    fn test_text_is_one_pair_per_line_sorted() {
        let text = sample().to_text();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "output_path = \"/out/app\"");
        assert_eq!(lines[1], "platform = \"nodejs\"");
        assert!(lines.iter().all(|l| l.contains(" = ")));
    }

    #[test]
    fn test_write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let manifest = sample();
        let path = manifest.write(dir.path()).unwrap();
        assert_eq!(path.file_name().unwrap(), MANIFEST_FILENAME);

        let loaded = BuildManifest::read(&path).unwrap().unwrap();
        assert_eq!(loaded, manifest);
        assert_eq!(loaded.get(keys::VERSION), Some("10.14"));
    }

    #[test]
    fn test_missing_manifest_is_none() {
        let dir = TempDir::new().unwrap();
        let result = BuildManifest::read(&dir.path().join(MANIFEST_FILENAME)).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_unparseable_manifest_is_none() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(MANIFEST_FILENAME);
        std::fs::write(&path, "platform nodejs ???").unwrap();
        assert!(BuildManifest::read(&path).unwrap().is_none());
    }

    #[test]
    fn test_rewrite_replaces_whole_file() {
        let dir = TempDir::new().unwrap();
        sample().write(dir.path()).unwrap();

        let mut second = BuildManifest::new();
        second.insert(keys::PLATFORM, "python");
        second.insert(keys::VERSION, "3.7.3");
        let path = second.write(dir.path()).unwrap();

        let loaded = BuildManifest::read(&path).unwrap().unwrap();
        assert_eq!(loaded.get(keys::PLATFORM), Some("python"));
        // Keys from the first write are gone, not merged.
        assert!(loaded.get(keys::SOURCE_PATH).is_none());
        assert!(!dir.path().join(format!("{}.tmp", MANIFEST_FILENAME)).exists());
    }

    #[test]
    fn test_write_is_deterministic() {
        let dir_a = TempDir::new().unwrap();
        let dir_b = TempDir::new().unwrap();
        let path_a = sample().write(dir_a.path()).unwrap();
        let path_b = sample().write(dir_b.path()).unwrap();
        assert_eq!(
            std::fs::read_to_string(path_a).unwrap(),
            std::fs::read_to_string(path_b).unwrap()
        );
    }
}
