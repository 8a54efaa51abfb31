//! Pipeline error taxonomy.
//!
//! Every stage of the build pipeline returns an explicit `BuildError` rather
//! than unwinding; the orchestrator stops at the first failing stage. Each
//! variant maps to a stable process exit code so callers (CI systems) can
//! distinguish detection failures from version or execution failures without
//! parsing stderr.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("could not detect a platform for the source tree; pass one explicitly with -l")]
    PlatformNotDetected,

    #[error("ambiguous platform: {} all matched with equal confidence; pass one explicitly with -l", .candidates.join(", "))]
    AmbiguousPlatform { candidates: Vec<String> },

    #[error("unknown platform '{name}'; supported platforms: {}", .supported.join(", "))]
    UnknownPlatform {
        name: String,
        supported: Vec<String>,
    },

    #[error("platform '{platform}' has no installed version matching '{requested}' (installed: {})",
            if .available.is_empty() { "none".to_string() } else { .available.join(", ") })]
    UnsupportedVersion {
        platform: String,
        requested: String,
        available: Vec<String>,
    },

    #[error("required build tool '{tool}' for platform '{platform}' was not found")]
    MissingBuildTool { platform: String, tool: String },

    #[error("build script exited with code {exit_code}")]
    BuildCommandFailed { exit_code: i32 },

    #[error("source directory does not exist: {}", .0.display())]
    SourceDirMissing(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Process exit codes, one per failure class. Stable across runs and
/// releases; 1 is reserved for failures outside the pipeline taxonomy.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL: i32 = 1;
    pub const DETECTION: i32 = 2;
    pub const VERSION: i32 = 3;
    pub const MISSING_TOOL: i32 = 4;
    pub const EXECUTION: i32 = 5;
    pub const IO: i32 = 6;
}

impl BuildError {
    pub fn exit_code(&self) -> i32 {
        match self {
            BuildError::PlatformNotDetected
            | BuildError::AmbiguousPlatform { .. }
            | BuildError::UnknownPlatform { .. } => exit_codes::DETECTION,
            BuildError::UnsupportedVersion { .. } => exit_codes::VERSION,
            BuildError::MissingBuildTool { .. } => exit_codes::MISSING_TOOL,
            BuildError::BuildCommandFailed { .. } => exit_codes::EXECUTION,
            BuildError::SourceDirMissing(_) | BuildError::Io(_) => exit_codes::IO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_are_distinct_per_class() {
        let detection = BuildError::PlatformNotDetected;
        let ambiguous = BuildError::AmbiguousPlatform {
            candidates: vec!["nodejs".to_string(), "php".to_string()],
        };
        let version = BuildError::UnsupportedVersion {
            platform: "nodejs".to_string(),
            requested: "99.0".to_string(),
            available: vec!["10.14.2".to_string()],
        };
        let tool = BuildError::MissingBuildTool {
            platform: "nodejs".to_string(),
            tool: "npm".to_string(),
        };
        let exec = BuildError::BuildCommandFailed { exit_code: 127 };

        assert_eq!(detection.exit_code(), 2);
        assert_eq!(ambiguous.exit_code(), 2);
        assert_eq!(version.exit_code(), 3);
        assert_eq!(tool.exit_code(), 4);
        assert_eq!(exec.exit_code(), 5);
    }

    #[test]
    fn test_unsupported_version_message_lists_installed() {
        let err = BuildError::UnsupportedVersion {
            platform: "python".to_string(),
            requested: "2.6".to_string(),
            available: vec!["3.7.3".to_string(), "3.8.0".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("python"));
        assert!(msg.contains("2.6"));
        assert!(msg.contains("3.7.3, 3.8.0"));
    }

    #[test]
    fn test_empty_inventory_message() {
        let err = BuildError::UnsupportedVersion {
            platform: "php".to_string(),
            requested: "latest".to_string(),
            available: vec![],
        };
        assert!(err.to_string().contains("installed: none"));
    }

    #[test]
    fn test_ambiguous_message_names_candidates() {
        let err = BuildError::AmbiguousPlatform {
            candidates: vec!["nodejs".to_string(), "python".to_string()],
        };
        assert!(err.to_string().contains("nodejs, python"));
    }
}
