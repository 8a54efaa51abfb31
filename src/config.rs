//! Invocation configuration.
//!
//! Everything environment-dependent (where toolchains are installed) is
//! carried in an explicit `BuildConfiguration` value threaded into the
//! orchestrator, never read from ambient process state mid-pipeline.
//! Concurrent invocations can therefore use different configurations
//! without interfering.

use std::env;
use std::path::PathBuf;

/// Environment variable overriding the default toolchain root.
pub const TOOLCHAIN_ROOT_ENV: &str = "FORGEBOX_TOOLCHAIN_ROOT";

const DEFAULT_TOOLCHAIN_ROOT: &str = "/opt";

#[derive(Debug, Clone)]
pub struct BuildConfiguration {
    /// Directory containing installed toolchains, laid out as
    /// `<root>/<platform>/<version>/`.
    pub toolchain_root: PathBuf,
}

impl BuildConfiguration {
    pub fn new(toolchain_root: PathBuf) -> Self {
        Self { toolchain_root }
    }

    /// Default configuration with the environment override applied. Called
    /// once at CLI startup; the resulting value is immutable afterwards.
    pub fn from_env() -> Self {
        let toolchain_root = env::var(TOOLCHAIN_ROOT_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_TOOLCHAIN_ROOT));
        Self { toolchain_root }
    }
}

impl Default for BuildConfiguration {
    fn default() -> Self {
        Self {
            toolchain_root: PathBuf::from(DEFAULT_TOOLCHAIN_ROOT),
        }
    }
}
