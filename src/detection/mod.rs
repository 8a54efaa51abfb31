//! Platform detection: score every definition against the source tree and
//! select one, or fail with a detection error.

use crate::error::BuildError;
use crate::platforms::{PlatformDefinition, PlatformRegistry, CERTAIN};
use crate::source::SourceRepository;
use crate::versions::VersionSource;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Platforms scoring below this are not considered detected at all.
pub const MIN_CONFIDENCE: f64 = 0.5;

/// How the platform choice was made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformSource {
    ExplicitFlag,
    Detected,
}

/// The single platform+version a successful pipeline run settles on.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedPlatform {
    pub platform: String,
    pub version: String,
    pub platform_source: PlatformSource,
    pub version_source: VersionSource,
}

/// Pick the platform for a source tree.
///
/// An explicit hint short-circuits scoring entirely (version resolution can
/// still fail independently). Otherwise every definition's rules run and
/// the highest confidence wins; sub-certain ties fall to the fixed priority
/// order, while two definitive markers (both `CERTAIN`) are a genuine
/// conflict and fail as `AmbiguousPlatform`.
pub fn detect(
    registry: &PlatformRegistry,
    repo: &SourceRepository,
    hint: Option<&str>,
) -> Result<(Arc<dyn PlatformDefinition>, PlatformSource), BuildError> {
    if let Some(name) = hint {
        let platform = registry
            .get(name)
            .ok_or_else(|| BuildError::UnknownPlatform {
                name: name.to_string(),
                supported: registry
                    .platform_ids()
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            })?;
        debug!(platform = platform.id(), "platform set by explicit flag");
        return Ok((platform, PlatformSource::ExplicitFlag));
    }

    let mut scored: Vec<(Arc<dyn PlatformDefinition>, f64)> = Vec::new();
    for platform in registry.iter() {
        if let Some(score) = platform.detect(repo) {
            debug!(
                platform = platform.id(),
                confidence = score.confidence,
                evidence = %score.evidence,
                "detection rule matched"
            );
            if score.confidence >= MIN_CONFIDENCE {
                scored.push((platform.clone(), score.confidence));
            }
        }
    }

    if scored.is_empty() {
        return Err(BuildError::PlatformNotDetected);
    }

    let top = scored
        .iter()
        .map(|(_, c)| *c)
        .fold(f64::NEG_INFINITY, f64::max);
    let mut leaders: Vec<&Arc<dyn PlatformDefinition>> = scored
        .iter()
        .filter(|(_, c)| *c == top)
        .map(|(p, _)| p)
        .collect();

    if leaders.len() == 1 {
        return Ok((leaders[0].clone(), PlatformSource::Detected));
    }

    // Priority only arbitrates heuristic ties; a tie between definitive
    // markers is a genuine conflict.
    if top >= CERTAIN {
        return Err(ambiguous(&leaders));
    }

    leaders.sort_by_key(|p| std::cmp::Reverse(p.priority()));
    if leaders[0].priority() == leaders[1].priority() {
        return Err(ambiguous(&leaders));
    }
    Ok((leaders[0].clone(), PlatformSource::Detected))
}

fn ambiguous(leaders: &[&Arc<dyn PlatformDefinition>]) -> BuildError {
    let mut candidates: Vec<String> = leaders.iter().map(|p| p.id().to_string()).collect();
    candidates.sort();
    BuildError::AmbiguousPlatform { candidates }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn repo_with(files: &[(&str, &str)]) -> (TempDir, SourceRepository) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let repo = SourceRepository::scan(dir.path()).unwrap();
        (dir, repo)
    }

    #[test]
    fn test_single_marker_detects_that_platform() {
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("package.json", "{}")]);
        let (platform, source) = detect(&registry, &repo, None).unwrap();
        assert_eq!(platform.id(), "nodejs");
        assert_eq!(source, PlatformSource::Detected);
    }

    #[test]
    fn test_each_platform_marker_is_unambiguous() {
        let registry = PlatformRegistry::with_defaults();
        let cases: &[(&str, &str, &str)] = &[
            ("package.json", "{}", "nodejs"),
            ("requirements.txt", "flask", "python"),
            ("App.csproj", "<Project></Project>", "dotnet"),
            ("composer.json", "{}", "php"),
        ];
        for &(marker, content, expected) in cases {
            let (_dir, repo) = repo_with(&[(marker, content)]);
            let (platform, _) = detect(&registry, &repo, None).unwrap();
            assert_eq!(platform.id(), expected, "marker {}", marker);
        }
    }

    #[test]
    fn test_empty_tree_is_not_detected() {
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("readme.md", "docs only")]);
        let err = detect(&registry, &repo, None).unwrap_err();
        assert!(matches!(err, BuildError::PlatformNotDetected));
    }

    #[test]
    fn test_two_markers_are_ambiguous() {
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("package.json", "{}"), ("requirements.txt", "flask")]);
        let err = detect(&registry, &repo, None).unwrap_err();
        match err {
            BuildError::AmbiguousPlatform { candidates } => {
                assert_eq!(candidates, vec!["nodejs", "python"]);
            }
            other => panic!("expected AmbiguousPlatform, got {:?}", other),
        }
    }

    #[test]
    fn test_explicit_hint_short_circuits_markers() {
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("package.json", "{}"), ("requirements.txt", "flask")]);
        let (platform, source) = detect(&registry, &repo, Some("python")).unwrap();
        assert_eq!(platform.id(), "python");
        assert_eq!(source, PlatformSource::ExplicitFlag);
    }

    #[test]
    fn test_unknown_hint_fails_with_supported_list() {
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("package.json", "{}")]);
        let err = detect(&registry, &repo, Some("cobol")).unwrap_err();
        match err {
            BuildError::UnknownPlatform { name, supported } => {
                assert_eq!(name, "cobol");
                assert!(supported.contains(&"nodejs".to_string()));
            }
            other => panic!("expected UnknownPlatform, got {:?}", other),
        }
    }

    #[test]
    fn test_sub_certain_tie_falls_to_priority() {
        // app.js (nodejs, 0.8) and App.sln (dotnet, 0.8) tie below
        // certainty; dotnet holds the higher fixed priority.
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("app.js", ""), ("App.sln", "")]);
        let (platform, _) = detect(&registry, &repo, None).unwrap();
        assert_eq!(platform.id(), "dotnet");
    }

    #[test]
    fn test_detection_is_deterministic() {
        let registry = PlatformRegistry::with_defaults();
        let (_dir, repo) = repo_with(&[("package.json", "{}")]);
        let first = detect(&registry, &repo, None).unwrap().0.id();
        for _ in 0..10 {
            assert_eq!(detect(&registry, &repo, None).unwrap().0.id(), first);
        }
    }
}
