//! Build script model: labeled phases assembled into fail-fast shell text.

mod template;

pub use template::{render, RenderedBuild};

use crate::source::SourceRepository;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// One labeled segment of the generated script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptPhase {
    pub label: String,
    pub commands: Vec<String>,
}

impl ScriptPhase {
    pub fn new(label: &str, commands: Vec<String>) -> Self {
        Self {
            label: label.to_string(),
            commands,
        }
    }
}

/// An ordered, fail-fast shell script. Any command exiting nonzero aborts
/// the whole script; later phases never run after a failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildScript {
    preamble: Vec<String>,
    phases: Vec<ScriptPhase>,
}

impl BuildScript {
    pub fn new(preamble: Vec<String>, phases: Vec<ScriptPhase>) -> Self {
        Self { preamble, phases }
    }

    pub fn phases(&self) -> &[ScriptPhase] {
        &self.phases
    }

    /// Render to executable bash text. Output is a pure function of the
    /// phases, so unchanged inputs produce byte-identical scripts.
    pub fn to_shell(&self) -> String {
        let mut out = String::new();
        out.push_str("#!/bin/bash\n");
        out.push_str("set -e\n\n");
        for line in &self.preamble {
            out.push_str(line);
            out.push('\n');
        }
        if !self.preamble.is_empty() {
            out.push('\n');
        }

        let total = self.phases.len();
        for (index, phase) in self.phases.iter().enumerate() {
            out.push_str(&format!(
                "echo \"Build phase {}/{}: {}\"\n",
                index + 1,
                total,
                phase.label
            ));
            for command in &phase.commands {
                out.push_str(command);
                out.push('\n');
            }
            out.push('\n');
        }
        out.push_str("echo \"Build complete.\"\n");
        out
    }
}

/// Everything a platform needs to contribute its phase commands.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    pub repo: &'a SourceRepository,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub intermediate_dir: Option<PathBuf>,
    pub version: String,
    /// Toolchain installation directory for the resolved version.
    pub install_dir: PathBuf,
    /// Open key/value build properties (`-p key=value`). Platforms branch on
    /// the keys they recognize and ignore the rest.
    pub properties: BTreeMap<String, String>,
}

impl RenderContext<'_> {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(|v| v.as_str())
    }

    pub fn property_is(&self, key: &str, value: &str) -> bool {
        self.property(key) == Some(value)
    }
}

/// Per-phase command lists contributed by a platform, plus the manifest
/// entries the build sets (e.g. a compression format or an injected agent).
#[derive(Debug, Clone, Default)]
pub struct BuildPlan {
    pub environment: Vec<String>,
    pub install: Vec<String>,
    pub build: Vec<String>,
    pub post_build: Vec<String>,
    pub output: Vec<String>,
    pub manifest_entries: BTreeMap<String, String>,
}
