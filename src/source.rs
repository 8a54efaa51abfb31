//! Read-only snapshot of a source tree.
//!
//! The tree is walked once per invocation (depth-limited, build output and
//! VCS directories skipped) and the listing is immutable for the pipeline's
//! duration, so detection stays a pure function of its inputs.

use crate::error::BuildError;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directories that never contain platform evidence.
const EXCLUDED_DIRS: &[&str] = &[
    ".git",
    ".idea",
    ".vscode",
    "node_modules",
    "__pycache__",
    ".venv",
    "bin",
    "obj",
    "vendor",
];

/// Directory depth scanned below the root. Platform markers live at the
/// root; one extra level covers single-project subdirectory layouts.
const MAX_DEPTH: usize = 2;

#[derive(Debug, Clone)]
struct FileEntry {
    relative: PathBuf,
    name: String,
    extension: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SourceRepository {
    root: PathBuf,
    files: Vec<FileEntry>,
}

impl SourceRepository {
    pub fn scan(root: &Path) -> Result<Self, BuildError> {
        if !root.is_dir() {
            return Err(BuildError::SourceDirMissing(root.to_path_buf()));
        }

        let mut files = Vec::new();
        let walker = WalkBuilder::new(root)
            .max_depth(Some(MAX_DEPTH))
            .standard_filters(false)
            .hidden(false)
            .filter_entry(|entry| {
                let name = entry.file_name().to_string_lossy();
                !(entry.file_type().map(|t| t.is_dir()).unwrap_or(false)
                    && EXCLUDED_DIRS.contains(&name.as_ref()))
            })
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().map(|t| t.is_file()).unwrap_or(false) {
                continue;
            }
            let relative = match entry.path().strip_prefix(root) {
                Ok(rel) => rel.to_path_buf(),
                Err(_) => continue,
            };
            let name = entry.file_name().to_string_lossy().to_string();
            let extension = entry
                .path()
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase());
            files.push(FileEntry {
                relative,
                name,
                extension,
            });
        }

        debug!(root = %root.display(), files = files.len(), "scanned source tree");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// True if a file with this exact name exists directly under the root.
    pub fn has_root_file(&self, name: &str) -> bool {
        self.files
            .iter()
            .any(|f| f.name == name && f.relative.parent() == Some(Path::new("")))
    }

    /// True if a file with this name exists anywhere in the scanned depth.
    pub fn contains_file(&self, name: &str) -> bool {
        self.files.iter().any(|f| f.name == name)
    }

    /// Names of root-level files ending with the given suffix (e.g. ".csproj").
    pub fn root_files_with_suffix(&self, suffix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .files
            .iter()
            .filter(|f| {
                f.relative.parent() == Some(Path::new("")) && f.name.ends_with(suffix)
            })
            .map(|f| f.name.as_str())
            .collect();
        names.sort();
        names
    }

    /// Number of scanned files carrying the given extension (no dot).
    pub fn count_with_extension(&self, ext: &str) -> usize {
        self.files
            .iter()
            .filter(|f| f.extension.as_deref() == Some(ext))
            .count()
    }

    /// Total number of scanned files.
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Read a root-level file's contents, if it exists and is valid UTF-8.
    pub fn read_root_file(&self, name: &str) -> Option<String> {
        if !self.has_root_file(name) {
            return None;
        }
        std::fs::read_to_string(self.root.join(name)).ok()
    }
}
