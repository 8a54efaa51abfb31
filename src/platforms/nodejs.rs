//! Node.js platform definition.

use super::{
    atomic_archive, copy_output, toolchain_environment, DetectionScore, PlatformDefinition,
};
use crate::error::BuildError;
use crate::script::{BuildPlan, RenderContext};
use crate::source::SourceRepository;
use serde_json::Value;

/// Build property selecting a compression format for `node_modules`
/// (`tar-gz` or `zip`).
pub const COMPRESS_NODE_MODULES: &str = "compress_node_modules";

/// Build property requesting injection of the Application Insights agent
/// loader (`true`).
pub const INJECT_APPINSIGHTS: &str = "inject_appinsights";

const APPINSIGHTS_LOADER: &str = "forgebox-appinsightsloader.js";

#[derive(Debug)]
pub struct NodeJsPlatform;

impl NodeJsPlatform {
    fn package_json(&self, repo: &SourceRepository) -> Option<Value> {
        let content = repo.read_root_file("package.json")?;
        serde_json::from_str(&content).ok()
    }

    fn has_build_script(&self, repo: &SourceRepository) -> bool {
        self.package_json(repo)
            .and_then(|pkg| pkg.get("scripts")?.get("build").cloned())
            .is_some()
    }

    fn uses_yarn(&self, repo: &SourceRepository) -> bool {
        repo.has_root_file("yarn.lock")
    }
}

impl PlatformDefinition for NodeJsPlatform {
    fn id(&self) -> &'static str {
        "nodejs"
    }

    fn display_name(&self) -> &'static str {
        "Node.js"
    }

    fn priority(&self) -> u8 {
        30
    }

    fn detect(&self, repo: &SourceRepository) -> Option<DetectionScore> {
        if repo.has_root_file("package.json") {
            return Some(DetectionScore::certain("package.json"));
        }
        for lockfile in ["package-lock.json", "yarn.lock"] {
            if repo.has_root_file(lockfile) {
                return Some(DetectionScore::heuristic(0.9, lockfile));
            }
        }
        for entry in ["server.js", "app.js"] {
            if repo.has_root_file(entry) {
                return Some(DetectionScore::heuristic(0.8, entry));
            }
        }

        let js_files = repo.count_with_extension("js") + repo.count_with_extension("mjs");
        if js_files > 0 && js_files * 2 >= repo.file_count() {
            return Some(DetectionScore::heuristic(0.6, "dominant .js files"));
        }
        None
    }

    fn version_pin(&self, repo: &SourceRepository) -> Option<String> {
        let pin = self
            .package_json(repo)?
            .get("engines")?
            .get("node")?
            .as_str()?
            .trim()
            .to_string();
        if pin.is_empty() {
            None
        } else {
            Some(pin)
        }
    }

    fn default_version(&self) -> &'static str {
        "10.14"
    }

    fn required_tools(&self, ctx: &RenderContext<'_>) -> Vec<String> {
        let mut tools = vec!["node".to_string(), "npm".to_string()];
        if self.uses_yarn(ctx.repo) {
            tools.push("yarn".to_string());
        }
        match ctx.property(COMPRESS_NODE_MODULES) {
            Some("tar-gz") => tools.push("tar".to_string()),
            Some("zip") => tools.push("zip".to_string()),
            _ => {}
        }
        tools
    }

    fn build_plan(&self, ctx: &RenderContext<'_>) -> Result<BuildPlan, BuildError> {
        let mut plan = BuildPlan {
            environment: toolchain_environment(ctx, self.display_name()),
            ..Default::default()
        };

        let yarn = self.uses_yarn(ctx.repo);
        plan.install.push("cd \"$SOURCE_DIR\"".to_string());
        if yarn {
            plan.install
                .push("echo \"Running 'yarn install'...\"".to_string());
            plan.install.push("yarn install".to_string());
        } else {
            plan.install
                .push("echo \"Running 'npm install'...\"".to_string());
            plan.install.push("npm install --unsafe-perm".to_string());
        }

        if self.has_build_script(ctx.repo) {
            plan.build.push("cd \"$SOURCE_DIR\"".to_string());
            if yarn {
                plan.build.push("yarn run build".to_string());
            } else {
                plan.build.push("npm run build".to_string());
            }
        }

        let mut output_excludes: Vec<&str> = Vec::new();
        match ctx.property(COMPRESS_NODE_MODULES) {
            Some(format @ "tar-gz") => {
                plan.post_build.push("cd \"$SOURCE_DIR\"".to_string());
                plan.post_build.extend(atomic_archive(
                    "tar -zcf \"node_modules.tar.gz.tmp\" node_modules",
                    "node_modules.tar.gz",
                ));
                plan.manifest_entries
                    .insert("compressed_node_modules".to_string(), format.to_string());
                output_excludes.push("node_modules");
            }
            Some(format @ "zip") => {
                plan.post_build.push("cd \"$SOURCE_DIR\"".to_string());
                plan.post_build.extend(atomic_archive(
                    "zip -y -q -r \"node_modules.zip.tmp\" node_modules",
                    "node_modules.zip",
                ));
                plan.manifest_entries
                    .insert("compressed_node_modules".to_string(), format.to_string());
                output_excludes.push("node_modules");
            }
            // Unrecognized formats pass through untouched; the platform
            // only acts on the values it understands.
            _ => {}
        }

        if ctx.property_is(INJECT_APPINSIGHTS, "true") {
            plan.post_build.push("cd \"$SOURCE_DIR\"".to_string());
            plan.post_build.push(format!(
                "echo \"require('applicationinsights').setup().start();\" > \"{}\"",
                APPINSIGHTS_LOADER
            ));
            plan.manifest_entries
                .insert("injected_appinsights".to_string(), "true".to_string());
        }

        plan.output = copy_output(&output_excludes);
        Ok(plan)
    }
}
