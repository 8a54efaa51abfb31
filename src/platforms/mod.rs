//! Platform definitions and registry for build script generation.
//!
//! Each supported platform is a unit struct implementing
//! [`PlatformDefinition`]: detection rules over a scanned source tree, a
//! repo-local version pin reader, a default version policy, and the phase
//! commands it contributes to the generated build script. The set is closed
//! and registered once at startup in [`PlatformRegistry::with_defaults`].

mod dotnet;
mod nodejs;
mod php;
mod python;
mod registry;

pub use dotnet::DotNetPlatform;
pub use nodejs::NodeJsPlatform;
pub use php::PhpPlatform;
pub use python::PythonPlatform;
pub use registry::PlatformRegistry;

use crate::error::BuildError;
use crate::script::{BuildPlan, RenderContext};
use crate::source::SourceRepository;

/// Detection confidence for a definitive platform marker. Two platforms
/// both claiming this score is an ambiguity, never a priority call.
pub const CERTAIN: f64 = 1.0;

/// Outcome of one platform's detection rules against a source tree.
#[derive(Debug, Clone)]
pub struct DetectionScore {
    /// Confidence in `[0.0, 1.0]`; `CERTAIN` means a definitive marker file.
    pub confidence: f64,
    /// The rule that fired, for diagnostics (e.g. "package.json").
    pub evidence: String,
}

impl DetectionScore {
    pub fn certain(evidence: &str) -> Self {
        Self {
            confidence: CERTAIN,
            evidence: evidence.to_string(),
        }
    }

    pub fn heuristic(confidence: f64, evidence: &str) -> Self {
        Self {
            confidence,
            evidence: evidence.to_string(),
        }
    }
}

/// A supported language/runtime platform.
pub trait PlatformDefinition: Send + Sync + std::fmt::Debug {
    /// Unique platform identifier, used in CLI flags, inventory directories
    /// and the build manifest.
    fn id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Fixed tie-break priority; higher wins among sub-certain detection
    /// ties. Values must be unique across the registry.
    fn priority(&self) -> u8;

    /// Evaluate detection rules against the scanned tree. Rules are
    /// existence/content checks only, never code execution.
    fn detect(&self, repo: &SourceRepository) -> Option<DetectionScore>;

    /// Version constraint pinned inside the repo itself (e.g. an `engines`
    /// field), read by this platform's own parser. Opaque to the caller.
    fn version_pin(&self, repo: &SourceRepository) -> Option<String>;

    /// Version used when neither the caller nor the repo pins one; clipped
    /// to the nearest installed version during resolution.
    fn default_version(&self) -> &'static str;

    /// Executables the generated script will invoke. Each is looked up in
    /// the resolved toolchain's `bin/` directory first, then on `PATH`.
    fn required_tools(&self, ctx: &RenderContext<'_>) -> Vec<String>;

    /// Contribute phase commands and manifest entries for the resolved
    /// version and build properties.
    fn build_plan(&self, ctx: &RenderContext<'_>) -> Result<BuildPlan, BuildError>;
}

/// Environment phase shared by all platforms: put the resolved toolchain's
/// `bin/` directory first on `PATH`.
pub(crate) fn toolchain_environment(ctx: &RenderContext<'_>, display_name: &str) -> Vec<String> {
    vec![
        format!("TOOLCHAIN_DIR=\"{}\"", ctx.install_dir.display()),
        "export PATH=\"$TOOLCHAIN_DIR/bin:$PATH\"".to_string(),
        format!(
            "echo \"Using {} version {} from $TOOLCHAIN_DIR\"",
            display_name, ctx.version
        ),
    ]
}

/// Output phase shared by platforms that copy the built tree as-is.
/// `mkdir -p` and `cp -rf` keep re-runs idempotent.
pub(crate) fn copy_output(excludes: &[&str]) -> Vec<String> {
    let mut commands = vec!["mkdir -p \"$OUTPUT_DIR\"".to_string()];
    if excludes.is_empty() {
        commands.push("cp -rf \"$SOURCE_DIR\"/. \"$OUTPUT_DIR\"".to_string());
    } else {
        let excluded: Vec<String> = excludes
            .iter()
            .map(|e| format!("--exclude={}", e))
            .collect();
        commands.push(format!(
            "tar -C \"$SOURCE_DIR\" {} -cf - . | tar -C \"$OUTPUT_DIR\" -xf -",
            excluded.join(" ")
        ));
    }
    commands
}

/// Replace `<dir>/<archive>` atomically: write to a temp name in the same
/// directory, then `mv -f` over the destination. Re-runs against an existing
/// archive yield one valid archive, never an appended or corrupt one.
pub(crate) fn atomic_archive(create_command: &str, archive: &str) -> Vec<String> {
    vec![
        format!("rm -f \"{}.tmp\"", archive),
        create_command.to_string(),
        format!("mv -f \"{}.tmp\" \"{}\"", archive, archive),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_score_constructors() {
        let certain = DetectionScore::certain("package.json");
        assert_eq!(certain.confidence, CERTAIN);
        assert_eq!(certain.evidence, "package.json");

        let heuristic = DetectionScore::heuristic(0.6, "js file ratio");
        assert!(heuristic.confidence < CERTAIN);
    }

    #[test]
    fn test_copy_output_with_excludes_uses_tar_pipe() {
        let commands = copy_output(&["node_modules"]);
        assert!(commands[0].contains("mkdir -p"));
        assert!(commands[1].contains("--exclude=node_modules"));
        assert!(commands[1].contains("tar -C \"$SOURCE_DIR\""));
    }

    #[test]
    fn test_atomic_archive_replaces_via_temp_name() {
        let commands = atomic_archive(
            "tar -zcf \"node_modules.tar.gz.tmp\" node_modules",
            "node_modules.tar.gz",
        );
        assert_eq!(commands.len(), 3);
        assert!(commands[0].starts_with("rm -f"));
        assert!(commands[2].contains("mv -f \"node_modules.tar.gz.tmp\" \"node_modules.tar.gz\""));
    }
}
