//! Version constraints and resolution against the toolchain inventory.
//!
//! Inventory entries keep their original directory name (`"10.14"`) next to
//! a zero-padded `semver::Version` sort key, so candidate ordering is always
//! numeric (major, minor, patch) and never lexical or insertion order.

use crate::error::BuildError;
use crate::inventory::ToolchainInventory;
use crate::platforms::PlatformDefinition;
use crate::source::SourceRepository;
use semver::{Version, VersionReq};
use std::cmp::Ordering;
use tracing::debug;

/// One installed toolchain version: the raw directory name plus its
/// normalized semver sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformVersion {
    pub raw: String,
    pub key: Version,
}

impl PlatformVersion {
    /// Parse a version string, padding missing minor/patch components with
    /// zeros. Returns `None` for strings that are not dotted numerics.
    pub fn parse(raw: &str) -> Option<Self> {
        let key = parse_version_lenient(raw)?;
        Some(Self {
            raw: raw.to_string(),
            key,
        })
    }
}

impl Ord for PlatformVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then_with(|| self.raw.cmp(&other.raw))
    }
}

impl PartialOrd for PlatformVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Parse a version string, allowing for incomplete versions ("10", "10.14").
pub fn parse_version_lenient(s: &str) -> Option<Version> {
    let s = s.trim();
    if let Ok(v) = s.parse() {
        return Some(v);
    }

    let parts: Vec<&str> = s.split('.').collect();
    match parts.len() {
        1 => {
            let major: u64 = parts[0].parse().ok()?;
            Some(Version::new(major, 0, 0))
        }
        2 => {
            let major: u64 = parts[0].parse().ok()?;
            let minor: u64 = parts[1].parse().ok()?;
            Some(Version::new(major, minor, 0))
        }
        _ => None,
    }
}

/// A caller- or repo-supplied version constraint.
///
/// `Requirement` is only ever produced from repo-local pins (e.g. an
/// `engines` range like `">=8 <11"`); the CLI flag parses to one of the
/// other variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionConstraint {
    Unspecified,
    Exact(String),
    Partial(String),
    Latest,
    Requirement(VersionReq),
}

impl VersionConstraint {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return VersionConstraint::Unspecified;
        }
        if raw.eq_ignore_ascii_case("latest") {
            return VersionConstraint::Latest;
        }

        if raw.chars().all(|c| c.is_ascii_digit() || c == '.') {
            let components = raw.split('.').count();
            if components <= 2 {
                return VersionConstraint::Partial(raw.to_string());
            }
            return VersionConstraint::Exact(raw.to_string());
        }

        if let Ok(req) = VersionReq::parse(raw) {
            return VersionConstraint::Requirement(req);
        }
        // npm-style ranges separate comparators with spaces (">=8 <11");
        // semver wants commas.
        let comma_joined = raw.split_whitespace().collect::<Vec<_>>().join(", ");
        match VersionReq::parse(&comma_joined) {
            Ok(req) => VersionConstraint::Requirement(req),
            // An unparseable constraint resolves against nothing and
            // surfaces as UnsupportedVersion with the original text.
            Err(_) => VersionConstraint::Exact(raw.to_string()),
        }
    }

    pub fn is_unspecified(&self) -> bool {
        matches!(self, VersionConstraint::Unspecified)
    }
}

impl std::fmt::Display for VersionConstraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionConstraint::Unspecified => write!(f, "(unspecified)"),
            VersionConstraint::Exact(v) | VersionConstraint::Partial(v) => write!(f, "{}", v),
            VersionConstraint::Latest => write!(f, "latest"),
            VersionConstraint::Requirement(req) => write!(f, "{}", req),
        }
    }
}

/// Where the resolved version came from; recorded on the resolved platform
/// so failures can report requested-vs-resolved provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VersionSource {
    CallerFlag,
    RepoPin,
    PlatformDefault,
}

/// Resolve a constraint for `platform` against its installed versions.
///
/// `Unspecified` consults the platform's repo-local pin first (read by the
/// platform's own parser), then falls back to the platform default clipped
/// to the nearest installed version.
pub fn resolve(
    platform: &dyn PlatformDefinition,
    constraint: &VersionConstraint,
    inventory: &ToolchainInventory,
    repo: &SourceRepository,
) -> Result<(String, VersionSource), BuildError> {
    let installed = inventory.versions(platform.id());

    if !constraint.is_unspecified() {
        let version = resolve_constraint(platform.id(), constraint, installed)?;
        return Ok((version, VersionSource::CallerFlag));
    }

    if let Some(pin) = platform.version_pin(repo) {
        debug!(platform = platform.id(), pin = %pin, "using repo-local version pin");
        let pinned = VersionConstraint::parse(&pin);
        let version = resolve_constraint(platform.id(), &pinned, installed)?;
        return Ok((version, VersionSource::RepoPin));
    }

    let version = clip_to_installed(platform.id(), platform.default_version(), installed)?;
    Ok((version, VersionSource::PlatformDefault))
}

/// Resolve a concrete (non-unspecified) constraint. Ties are always broken
/// by numeric maximum.
pub fn resolve_constraint(
    platform_id: &str,
    constraint: &VersionConstraint,
    installed: &[PlatformVersion],
) -> Result<String, BuildError> {
    let unsupported = |requested: String| BuildError::UnsupportedVersion {
        platform: platform_id.to_string(),
        requested,
        available: installed.iter().map(|v| v.raw.clone()).collect(),
    };

    let mut candidates: Vec<&PlatformVersion> = installed.iter().collect();
    candidates.sort();

    match constraint {
        VersionConstraint::Unspecified | VersionConstraint::Latest => candidates
            .last()
            .map(|v| v.raw.clone())
            .ok_or_else(|| unsupported("latest".to_string())),

        VersionConstraint::Exact(wanted) => {
            if let Some(found) = candidates.iter().find(|v| v.raw == *wanted) {
                return Ok(found.raw.clone());
            }
            let wanted_key = parse_version_lenient(wanted);
            candidates
                .iter()
                .find(|v| Some(&v.key) == wanted_key.as_ref())
                .map(|v| v.raw.clone())
                .ok_or_else(|| unsupported(wanted.clone()))
        }

        VersionConstraint::Partial(prefix) => {
            let parts: Vec<u64> = prefix.split('.').filter_map(|p| p.parse().ok()).collect();
            candidates
                .iter()
                .filter(|v| match parts.as_slice() {
                    [major] => v.key.major == *major,
                    [major, minor] => v.key.major == *major && v.key.minor == *minor,
                    _ => false,
                })
                .max()
                .map(|v| v.raw.clone())
                .ok_or_else(|| unsupported(prefix.clone()))
        }

        VersionConstraint::Requirement(req) => candidates
            .iter()
            .filter(|v| req.matches(&v.key))
            .max()
            .map(|v| v.raw.clone())
            .ok_or_else(|| unsupported(req.to_string())),
    }
}

/// Clip a platform's declared default version to the nearest installed one:
/// same major.minor with the highest patch when available, otherwise the
/// highest installed version overall.
fn clip_to_installed(
    platform_id: &str,
    default: &str,
    installed: &[PlatformVersion],
) -> Result<String, BuildError> {
    let unsupported = || BuildError::UnsupportedVersion {
        platform: platform_id.to_string(),
        requested: default.to_string(),
        available: installed.iter().map(|v| v.raw.clone()).collect(),
    };

    let default_key = parse_version_lenient(default).ok_or_else(unsupported)?;

    let same_minor = installed
        .iter()
        .filter(|v| v.key.major == default_key.major && v.key.minor == default_key.minor)
        .max();
    if let Some(found) = same_minor {
        return Ok(found.raw.clone());
    }

    installed
        .iter()
        .max()
        .map(|v| v.raw.clone())
        .ok_or_else(unsupported)
}
