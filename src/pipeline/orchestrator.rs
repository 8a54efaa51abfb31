use super::BuildStage;
use crate::config::BuildConfiguration;
use crate::detection::{self, ResolvedPlatform};
use crate::error::BuildError;
use crate::inventory::ToolchainInventory;
use crate::manifest::{keys, BuildManifest};
use crate::platforms::{PlatformDefinition, PlatformRegistry};
use crate::script::{self, RenderContext};
use crate::source::SourceRepository;
use crate::versions::{self, VersionConstraint};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Command;
use tracing::{debug, info};

/// One build invocation's inputs.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub intermediate_dir: Option<PathBuf>,
    pub platform_hint: Option<String>,
    pub version_constraint: VersionConstraint,
    pub properties: BTreeMap<String, String>,
    /// Stop after rendering; return the script text without executing it or
    /// touching the output directory.
    pub dry_run: bool,
}

/// Result of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct BuildOutcome {
    pub resolved: ResolvedPlatform,
    pub script_text: String,
    /// Where the manifest was written; `None` for dry runs.
    pub manifest_path: Option<PathBuf>,
}

/// Drives the pipeline stages in order. Holds only read-only state, so one
/// orchestrator serves any number of sequential invocations and separate
/// instances can run concurrently.
pub struct BuildOrchestrator {
    config: BuildConfiguration,
    registry: PlatformRegistry,
}

impl BuildOrchestrator {
    pub fn new(config: BuildConfiguration, registry: PlatformRegistry) -> Self {
        Self { config, registry }
    }

    pub fn run(&self, request: &BuildRequest) -> Result<BuildOutcome, BuildError> {
        info!(stage = %BuildStage::Detecting, source = %request.source_dir.display(), "pipeline stage");
        let repo = SourceRepository::scan(&request.source_dir)?;
        let (platform, platform_source) =
            detection::detect(&self.registry, &repo, request.platform_hint.as_deref())?;

        info!(stage = %BuildStage::Resolving, platform = platform.id(), "pipeline stage");
        let platform_ids = self.registry.platform_ids();
        let inventory = ToolchainInventory::scan(&self.config.toolchain_root, &platform_ids);
        let (version, version_source) = versions::resolve(
            platform.as_ref(),
            &request.version_constraint,
            &inventory,
            &repo,
        )?;
        let resolved = ResolvedPlatform {
            platform: platform.id().to_string(),
            version: version.clone(),
            platform_source,
            version_source,
        };
        info!(
            platform = %resolved.platform,
            version = %resolved.version,
            requested = %request.version_constraint,
            "resolved platform"
        );

        info!(stage = %BuildStage::Rendering, "pipeline stage");
        let ctx = RenderContext {
            repo: &repo,
            source_dir: request.source_dir.clone(),
            output_dir: request.output_dir.clone(),
            intermediate_dir: request.intermediate_dir.clone(),
            version: version.clone(),
            install_dir: inventory.install_dir(platform.id(), &version),
            properties: request.properties.clone(),
        };
        let rendered = script::render(platform.as_ref(), &ctx)?;
        let script_text = rendered.script.to_shell();

        if request.dry_run {
            return Ok(BuildOutcome {
                resolved,
                script_text,
                manifest_path: None,
            });
        }

        self.check_tools(platform.as_ref(), &ctx)?;

        info!(stage = %BuildStage::Executing, "pipeline stage");
        self.execute(&script_text)?;

        info!(stage = %BuildStage::WritingManifest, "pipeline stage");
        let mut manifest = BuildManifest::new();
        manifest.insert(keys::PLATFORM, &resolved.platform);
        manifest.insert(keys::VERSION, &resolved.version);
        manifest.insert(keys::SOURCE_PATH, &request.source_dir.display().to_string());
        manifest.insert(keys::OUTPUT_PATH, &request.output_dir.display().to_string());
        manifest.extend(&rendered.manifest_entries);
        let manifest_path = manifest.write(&request.output_dir)?;

        info!(platform = %resolved.platform, version = %resolved.version, "build succeeded");
        Ok(BuildOutcome {
            resolved,
            script_text,
            manifest_path: Some(manifest_path),
        })
    }

    /// Verify every executable the script will invoke before running it:
    /// first in the resolved toolchain's `bin/`, then on `PATH`. The
    /// version being installed does not guarantee its tools are usable.
    fn check_tools(
        &self,
        platform: &dyn PlatformDefinition,
        ctx: &RenderContext<'_>,
    ) -> Result<(), BuildError> {
        let mut tools = vec!["bash".to_string()];
        tools.extend(platform.required_tools(ctx));
        for tool in tools {
            let in_toolchain = ctx.install_dir.join("bin").join(&tool).is_file();
            if in_toolchain || which::which(&tool).is_ok() {
                debug!(tool = %tool, "build tool located");
                continue;
            }
            return Err(BuildError::MissingBuildTool {
                platform: platform.id().to_string(),
                tool,
            });
        }
        Ok(())
    }

    /// Run the rendered script synchronously with inherited stdio, so the
    /// underlying tools' own output and stderr reach the caller verbatim.
    fn execute(&self, script_text: &str) -> Result<(), BuildError> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static SCRIPT_SEQ: AtomicU64 = AtomicU64::new(0);

        let script_path = std::env::temp_dir().join(format!(
            "forgebox-build-{}-{}.sh",
            std::process::id(),
            SCRIPT_SEQ.fetch_add(1, Ordering::Relaxed)
        ));
        std::fs::write(&script_path, script_text)?;
        debug!(script = %script_path.display(), "executing build script");

        let status = Command::new("bash").arg(&script_path).status()?;
        let _ = std::fs::remove_file(&script_path);

        if !status.success() {
            return Err(BuildError::BuildCommandFailed {
                exit_code: status.code().unwrap_or(-1),
            });
        }
        Ok(())
    }
}
