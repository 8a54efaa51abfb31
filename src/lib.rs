//! forgebox - build script generation with automatic platform detection
//!
//! This library inspects an arbitrary source tree, determines which
//! language/runtime platform it targets, resolves a concrete toolchain
//! version from the installed inventory, and produces an executable,
//! fail-fast build script for it - without the caller specifying anything
//! beyond an optional platform hint.
//!
//! # Core Concepts
//!
//! - **Platform definitions**: a closed set of supported platforms (nodejs,
//!   python, dotnet, php), each bundling detection rules, a repo-pin
//!   reader, a default version policy, and build phase commands
//! - **Detection**: inferring the target platform from the tree's contents
//!   (marker files, extension ratios) without executing any of its code
//! - **Version resolution**: matching an exact/partial/latest constraint
//!   against the versions actually installed in the build environment
//! - **Script assembly**: composing platform phase commands into one shell
//!   script that aborts on the first failing command
//!
//! # Pipeline
//!
//! Data flows one way: source tree -> detection -> version resolution ->
//! script rendering -> execution -> manifest. The [`pipeline`] module drives
//! these stages; a failure in any stage stops the run with no partial
//! artifacts.

pub mod cli;
pub mod config;
pub mod detection;
pub mod error;
pub mod inventory;
pub mod manifest;
pub mod pipeline;
pub mod platforms;
pub mod script;
pub mod source;
pub mod util;
pub mod versions;

pub use config::BuildConfiguration;
pub use detection::{detect, PlatformSource, ResolvedPlatform};
pub use error::BuildError;
pub use inventory::ToolchainInventory;
pub use manifest::{BuildManifest, MANIFEST_FILENAME};
pub use pipeline::{BuildOrchestrator, BuildOutcome, BuildRequest};
pub use platforms::{PlatformDefinition, PlatformRegistry};
pub use source::SourceRepository;
pub use versions::{VersionConstraint, VersionSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
