//! .NET Core platform definition.

use super::{atomic_archive, toolchain_environment, DetectionScore, PlatformDefinition};
use crate::error::BuildError;
use crate::script::{BuildPlan, RenderContext};
use crate::source::SourceRepository;
use regex::Regex;

/// Build property requesting the published output be archived into a single
/// compressed file (`true`).
pub const ZIP_ALL_OUTPUT: &str = "zip_all_output";

const OUTPUT_ARCHIVE: &str = "forgebox_output.tar.gz";

#[derive(Debug)]
pub struct DotNetPlatform;

impl DotNetPlatform {
    /// The project file driving the build: the alphabetically first root
    /// `.csproj`, falling back to `.fsproj`. Deterministic across runs.
    fn project_file(&self, repo: &SourceRepository) -> Option<String> {
        for suffix in [".csproj", ".fsproj"] {
            if let Some(name) = repo.root_files_with_suffix(suffix).first() {
                return Some(name.to_string());
            }
        }
        None
    }

    /// SDK version pinned in global.json, e.g. `{"sdk": {"version": "2.2.100"}}`.
    fn global_json_pin(&self, repo: &SourceRepository) -> Option<String> {
        let content = repo.read_root_file("global.json")?;
        let parsed: serde_json::Value = serde_json::from_str(&content).ok()?;
        let version = parsed.get("sdk")?.get("version")?.as_str()?.trim();
        if version.is_empty() {
            None
        } else {
            Some(version.to_string())
        }
    }

    /// Runtime version implied by the project's `<TargetFramework>`:
    /// `netcoreapp2.2` and `net6.0` both pin major.minor.
    fn target_framework_pin(&self, repo: &SourceRepository) -> Option<String> {
        let project = self.project_file(repo)?;
        let content = repo.read_root_file(&project)?;
        let doc = roxmltree::Document::parse(&content).ok()?;
        let framework = doc
            .descendants()
            .find(|n| n.has_tag_name("TargetFramework"))
            .and_then(|n| n.text())?
            .trim();

        let re = Regex::new(r"^(?:netcoreapp|net)(\d+\.\d+)").ok()?;
        let caps = re.captures(framework)?;
        Some(caps.get(1)?.as_str().to_string())
    }
}

impl PlatformDefinition for DotNetPlatform {
    fn id(&self) -> &'static str {
        "dotnet"
    }

    fn display_name(&self) -> &'static str {
        ".NET Core"
    }

    fn priority(&self) -> u8 {
        40
    }

    fn detect(&self, repo: &SourceRepository) -> Option<DetectionScore> {
        if let Some(project) = self.project_file(repo) {
            return Some(DetectionScore::certain(&project));
        }
        if repo.has_root_file("global.json") {
            return Some(DetectionScore::heuristic(0.9, "global.json"));
        }
        if let Some(solution) = repo.root_files_with_suffix(".sln").first() {
            return Some(DetectionScore::heuristic(0.8, solution));
        }

        let cs_files = repo.count_with_extension("cs");
        if cs_files > 0 && cs_files * 2 >= repo.file_count() {
            return Some(DetectionScore::heuristic(0.6, "dominant .cs files"));
        }
        None
    }

    fn version_pin(&self, repo: &SourceRepository) -> Option<String> {
        self.global_json_pin(repo)
            .or_else(|| self.target_framework_pin(repo))
    }

    fn default_version(&self) -> &'static str {
        "2.2"
    }

    fn required_tools(&self, ctx: &RenderContext<'_>) -> Vec<String> {
        let mut tools = vec!["dotnet".to_string()];
        if ctx.property_is(ZIP_ALL_OUTPUT, "true") {
            tools.push("tar".to_string());
        }
        tools
    }

    fn build_plan(&self, ctx: &RenderContext<'_>) -> Result<BuildPlan, BuildError> {
        let mut plan = BuildPlan {
            environment: toolchain_environment(ctx, self.display_name()),
            ..Default::default()
        };
        plan.environment
            .push("export DOTNET_CLI_TELEMETRY_OPTOUT=1".to_string());
        plan.environment
            .push("export NUGET_XMLDOC_MODE=skip".to_string());

        let project = self.project_file(ctx.repo);
        plan.install.push("cd \"$SOURCE_DIR\"".to_string());
        match &project {
            Some(name) => plan.install.push(format!("dotnet restore \"{}\"", name)),
            None => plan.install.push("dotnet restore".to_string()),
        }

        // dotnet publishes straight into the output directory; there is no
        // separate copy step for this platform.
        plan.build.push("cd \"$SOURCE_DIR\"".to_string());
        plan.build.push("mkdir -p \"$OUTPUT_DIR\"".to_string());
        match &project {
            Some(name) => plan.build.push(format!(
                "dotnet publish \"{}\" -c Release -o \"$OUTPUT_DIR\"",
                name
            )),
            None => plan
                .build
                .push("dotnet publish -c Release -o \"$OUTPUT_DIR\"".to_string()),
        }

        if let Some(name) = &project {
            let stem = name
                .trim_end_matches(".csproj")
                .trim_end_matches(".fsproj");
            plan.manifest_entries
                .insert("startup_dll_name".to_string(), format!("{}.dll", stem));
        }

        if ctx.property_is(ZIP_ALL_OUTPUT, "true") {
            plan.post_build.push("cd \"$OUTPUT_DIR\"".to_string());
            plan.post_build.extend(atomic_archive(
                &format!(
                    "tar --exclude=\"{archive}\" --exclude=\"{archive}.tmp\" -zcf \"{archive}.tmp\" .",
                    archive = OUTPUT_ARCHIVE
                ),
                OUTPUT_ARCHIVE,
            ));
            plan.manifest_entries
                .insert("zipped_output".to_string(), "true".to_string());
        }

        Ok(plan)
    }
}
