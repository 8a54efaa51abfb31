//! PHP platform definition.

use super::{copy_output, toolchain_environment, DetectionScore, PlatformDefinition};
use crate::error::BuildError;
use crate::script::{BuildPlan, RenderContext};
use crate::source::SourceRepository;

#[derive(Debug)]
pub struct PhpPlatform;

impl PhpPlatform {
    fn composer_json(&self, repo: &SourceRepository) -> Option<serde_json::Value> {
        let content = repo.read_root_file("composer.json")?;
        serde_json::from_str(&content).ok()
    }
}

impl PlatformDefinition for PhpPlatform {
    fn id(&self) -> &'static str {
        "php"
    }

    fn display_name(&self) -> &'static str {
        "PHP"
    }

    fn priority(&self) -> u8 {
        10
    }

    fn detect(&self, repo: &SourceRepository) -> Option<DetectionScore> {
        if repo.has_root_file("composer.json") {
            return Some(DetectionScore::certain("composer.json"));
        }
        if repo.has_root_file("index.php") {
            return Some(DetectionScore::heuristic(0.7, "index.php"));
        }

        let php_files = repo.count_with_extension("php");
        if php_files > 0 && php_files * 2 >= repo.file_count() {
            return Some(DetectionScore::heuristic(0.6, "dominant .php files"));
        }
        None
    }

    fn version_pin(&self, repo: &SourceRepository) -> Option<String> {
        let pin = self
            .composer_json(repo)?
            .get("require")?
            .get("php")?
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
        "7.3"
    }

    fn required_tools(&self, ctx: &RenderContext<'_>) -> Vec<String> {
        let mut tools = vec!["php".to_string()];
        if ctx.repo.has_root_file("composer.json") {
            tools.push("composer".to_string());
        }
        tools
    }

    fn build_plan(&self, ctx: &RenderContext<'_>) -> Result<BuildPlan, BuildError> {
        let mut plan = BuildPlan {
            environment: toolchain_environment(ctx, self.display_name()),
            ..Default::default()
        };
        plan.environment
            .push("echo \"PHP executable: $TOOLCHAIN_DIR/bin/php\"".to_string());

        plan.install.push("cd \"$SOURCE_DIR\"".to_string());
        if ctx.repo.has_root_file("composer.json") {
            plan.install
                .push("composer install --no-interaction --no-progress".to_string());
        } else {
            plan.install
                .push("echo \"No composer.json found, not running composer install.\"".to_string());
        }

        plan.output = copy_output(&[]);
        Ok(plan)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn repo_with(files: &[(&str, &str)]) -> (TempDir, SourceRepository) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let repo = SourceRepository::scan(dir.path()).unwrap();
        (dir, repo)
    }

    fn context<'a>(repo: &'a SourceRepository) -> RenderContext<'a> {
        RenderContext {
            repo,
            source_dir: repo.root().to_path_buf(),
            output_dir: PathBuf::from("/out"),
            intermediate_dir: None,
            version: "7.3.5".to_string(),
            install_dir: PathBuf::from("/opt/php/7.3.5"),
            properties: BTreeMap::new(),
        }
    }

    #[test]
    fn test_detect_composer_json_is_certain() {
        let (_dir, repo) = repo_with(&[("composer.json", "{}")]);
        let score = PhpPlatform.detect(&repo).unwrap();
        assert_eq!(score.confidence, 1.0);
    }

    #[test]
    fn test_detect_index_php_is_heuristic() {
        let (_dir, repo) = repo_with(&[("index.php", "<?php echo 1;")]);
        let score = PhpPlatform.detect(&repo).unwrap();
        assert!(score.confidence < 1.0);
    }

    #[test]
    fn test_version_pin_from_composer_require() {
        let (_dir, repo) = repo_with(&[("composer.json", r#"{"require": {"php": ">=7.1"}}"#)]);
        assert_eq!(PhpPlatform.version_pin(&repo).as_deref(), Some(">=7.1"));
    }

    #[test]
    fn test_plan_runs_composer_install() {
        let (_dir, repo) = repo_with(&[("composer.json", "{}")]);
        let ctx = context(&repo);
        let plan = PhpPlatform.build_plan(&ctx).unwrap();
        assert!(plan
            .install
            .iter()
            .any(|c| c.contains("composer install")));
        assert!(plan
            .environment
            .iter()
            .any(|c| c.contains("PHP executable:")));
    }

    #[test]
    fn test_plan_without_composer_json_skips_install() {
        let (_dir, repo) = repo_with(&[("index.php", "<?php echo 1;")]);
        let ctx = context(&repo);
        let plan = PhpPlatform.build_plan(&ctx).unwrap();
        assert!(plan
            .install
            .iter()
            .any(|c| c.contains("not running composer install")));
        let tools = PhpPlatform.required_tools(&ctx);
        assert!(!tools.contains(&"composer".to_string()));
    }
}
