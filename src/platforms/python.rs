//! Python platform definition.

use super::{copy_output, toolchain_environment, DetectionScore, PlatformDefinition};
use crate::error::BuildError;
use crate::script::{BuildPlan, RenderContext};
use crate::source::SourceRepository;
use regex::Regex;

/// Build property naming the virtual environment directory created during
/// dependency installation.
pub const VIRTUALENV_NAME: &str = "virtualenv_name";

const DEFAULT_VIRTUALENV: &str = "pythonenv";

#[derive(Debug)]
pub struct PythonPlatform;

impl PythonPlatform {
    fn runtime_pin(&self, repo: &SourceRepository) -> Option<String> {
        let content = repo.read_root_file("runtime.txt")?;
        let re = Regex::new(r"^\s*python-(\d+(?:\.\d+){0,2})\s*$").ok()?;
        let caps = re.captures(content.lines().next()?)?;
        Some(caps.get(1)?.as_str().to_string())
    }
}

impl PlatformDefinition for PythonPlatform {
    fn id(&self) -> &'static str {
        "python"
    }

    fn display_name(&self) -> &'static str {
        "Python"
    }

    fn priority(&self) -> u8 {
        20
    }

    fn detect(&self, repo: &SourceRepository) -> Option<DetectionScore> {
        if repo.has_root_file("requirements.txt") {
            return Some(DetectionScore::certain("requirements.txt"));
        }
        if self.runtime_pin(repo).is_some() {
            return Some(DetectionScore::certain("runtime.txt"));
        }
        if repo.has_root_file("setup.py") {
            return Some(DetectionScore::heuristic(0.9, "setup.py"));
        }

        let py_files = repo.count_with_extension("py");
        if py_files > 0 && py_files * 2 >= repo.file_count() {
            return Some(DetectionScore::heuristic(0.6, "dominant .py files"));
        }
        None
    }

    fn version_pin(&self, repo: &SourceRepository) -> Option<String> {
        self.runtime_pin(repo)
    }

    fn default_version(&self) -> &'static str {
        "3.7"
    }

    fn required_tools(&self, _ctx: &RenderContext<'_>) -> Vec<String> {
        vec!["python3".to_string()]
    }

    fn build_plan(&self, ctx: &RenderContext<'_>) -> Result<BuildPlan, BuildError> {
        let mut plan = BuildPlan {
            environment: toolchain_environment(ctx, self.display_name()),
            ..Default::default()
        };

        let venv = ctx
            .property(VIRTUALENV_NAME)
            .unwrap_or(DEFAULT_VIRTUALENV)
            .to_string();

        plan.install.push("cd \"$SOURCE_DIR\"".to_string());
        plan.install
            .push(format!("echo \"Creating virtual environment '{}'...\"", venv));
        plan.install
            .push(format!("python3 -m venv \"{}\" --copies", venv));
        plan.install.push(format!("source \"{}/bin/activate\"", venv));
        if ctx.repo.has_root_file("requirements.txt") {
            plan.install
                .push("pip install -r requirements.txt".to_string());
        } else if ctx.repo.has_root_file("setup.py") {
            plan.install.push("pip install .".to_string());
        } else {
            plan.install
                .push("echo \"No requirements.txt found; skipping pip install.\"".to_string());
        }

        plan.manifest_entries
            .insert("virtualenv_name".to_string(), venv);
        plan.output = copy_output(&["__pycache__"]);
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

    fn context<'a>(
        repo: &'a SourceRepository,
        properties: &[(&str, &str)],
    ) -> RenderContext<'a> {
        RenderContext {
            repo,
            source_dir: repo.root().to_path_buf(),
            output_dir: PathBuf::from("/out"),
            intermediate_dir: None,
            version: "3.7.3".to_string(),
            install_dir: PathBuf::from("/opt/python/3.7.3"),
            properties: properties
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    #[test]
    fn test_detect_requirements_txt_is_certain() {
        let (_dir, repo) = repo_with(&[("requirements.txt", "flask")]);
        let score = PythonPlatform.detect(&repo).unwrap();
        assert_eq!(score.confidence, 1.0);
    }

    #[test]
    fn test_detect_runtime_txt_is_certain() {
        let (_dir, repo) = repo_with(&[("runtime.txt", "python-3.7.3")]);
        let score = PythonPlatform.detect(&repo).unwrap();
        assert_eq!(score.confidence, 1.0);
        assert_eq!(score.evidence, "runtime.txt");
    }

    #[test]
    fn test_runtime_txt_without_python_prefix_is_not_a_marker() {
        let (_dir, repo) = repo_with(&[("runtime.txt", "jruby-9.0")]);
        assert!(PythonPlatform.detect(&repo).is_none());
    }

    #[test]
    fn test_detect_py_file_ratio() {
        let (_dir, repo) = repo_with(&[("app.py", ""), ("util.py", ""), ("readme.md", "")]);
        let score = PythonPlatform.detect(&repo).unwrap();
        assert!(score.confidence < 1.0);
    }

    #[test]
    fn test_version_pin_from_runtime_txt() {
        let (_dir, repo) = repo_with(&[("runtime.txt", "python-3.7.3\n")]);
        assert_eq!(PythonPlatform.version_pin(&repo).as_deref(), Some("3.7.3"));
    }

    #[test]
    fn test_plan_creates_virtualenv_with_default_name() {
        let (_dir, repo) = repo_with(&[("requirements.txt", "flask")]);
        let ctx = context(&repo, &[]);
        let plan = PythonPlatform.build_plan(&ctx).unwrap();
        assert!(plan
            .install
            .iter()
            .any(|c| c.contains("python3 -m venv \"pythonenv\"")));
        assert!(plan
            .install
            .iter()
            .any(|c| c.contains("pip install -r requirements.txt")));
        assert_eq!(
            plan.manifest_entries.get("virtualenv_name"),
            Some(&"pythonenv".to_string())
        );
    }

    #[test]
    fn test_virtualenv_name_property_overrides_default() {
        let (_dir, repo) = repo_with(&[("requirements.txt", "flask")]);
        let ctx = context(&repo, &[(VIRTUALENV_NAME, "antenv")]);
        let plan = PythonPlatform.build_plan(&ctx).unwrap();
        assert!(plan.install.iter().any(|c| c.contains("\"antenv\"")));
        assert_eq!(
            plan.manifest_entries.get("virtualenv_name"),
            Some(&"antenv".to_string())
        );
    }

    #[test]
    fn test_plan_without_requirements_skips_pip() {
        let (_dir, repo) = repo_with(&[("app.py", "print('hi')")]);
        let ctx = context(&repo, &[]);
        let plan = PythonPlatform.build_plan(&ctx).unwrap();
        assert!(plan
            .install
            .iter()
            .any(|c| c.contains("skipping pip install")));
    }
}
