//! Assembles a platform's `BuildPlan` into the final `BuildScript`.
//!
//! The engine owns the connective control flow: variable exports, the
//! optional intermediate-directory staging step, and the fixed phase order.
//! Platforms only contribute the commands inside each phase.

use super::{BuildPlan, BuildScript, RenderContext, ScriptPhase};
use crate::error::BuildError;
use crate::platforms::PlatformDefinition;
use std::collections::BTreeMap;

/// The rendered script plus the manifest entries the build will set.
#[derive(Debug, Clone)]
pub struct RenderedBuild {
    pub script: BuildScript,
    pub manifest_entries: BTreeMap<String, String>,
}

pub fn render(
    platform: &dyn PlatformDefinition,
    ctx: &RenderContext<'_>,
) -> Result<RenderedBuild, BuildError> {
    let plan = platform.build_plan(ctx)?;
    let script = assemble(ctx, &plan);
    Ok(RenderedBuild {
        script,
        manifest_entries: plan.manifest_entries,
    })
}

fn assemble(ctx: &RenderContext<'_>, plan: &BuildPlan) -> BuildScript {
    let mut preamble = vec![
        shell_assign("SOURCE_DIR", &ctx.source_dir.display().to_string()),
        shell_assign("OUTPUT_DIR", &ctx.output_dir.display().to_string()),
    ];
    if let Some(intermediate) = &ctx.intermediate_dir {
        preamble.push(shell_assign(
            "INTERMEDIATE_DIR",
            &intermediate.display().to_string(),
        ));
    }

    let mut phases = Vec::new();

    // Staging into the intermediate directory keeps the caller's source tree
    // untouched by in-tree build steps. Later phases operate on $SOURCE_DIR,
    // which is re-pointed here.
    if ctx.intermediate_dir.is_some() {
        phases.push(ScriptPhase::new(
            "Prepare source",
            vec![
                "mkdir -p \"$INTERMEDIATE_DIR\"".to_string(),
                "cp -rf \"$SOURCE_DIR\"/. \"$INTERMEDIATE_DIR\"".to_string(),
                "SOURCE_DIR=\"$INTERMEDIATE_DIR\"".to_string(),
            ],
        ));
    }

    // Building in place (no -o, no staging) has nothing to copy; cp would
    // refuse to copy a directory onto itself.
    let in_place = ctx.intermediate_dir.is_none() && ctx.output_dir == ctx.source_dir;

    for (label, commands) in [
        ("Setup environment", &plan.environment),
        ("Install dependencies", &plan.install),
        ("Build", &plan.build),
        ("Post-build", &plan.post_build),
        ("Copy output", &plan.output),
    ] {
        if label == "Copy output" && in_place {
            continue;
        }
        if !commands.is_empty() {
            phases.push(ScriptPhase::new(label, commands.clone()));
        }
    }

    BuildScript::new(preamble, phases)
}

/// Double-quoted shell variable assignment with the characters that are
/// special inside double quotes escaped.
fn shell_assign(name: &str, value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '"' | '$' | '`' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    format!("{}=\"{}\"", name, escaped)
}
