//! Subcommand handlers. Each returns the process exit code.

use super::commands::{BuildArgs, OutputFormatArg, PlatformsArgs};
use crate::config::BuildConfiguration;
use crate::error::exit_codes;
use crate::inventory::ToolchainInventory;
use crate::pipeline::{BuildOrchestrator, BuildRequest};
use crate::platforms::PlatformRegistry;
use crate::versions::VersionConstraint;
use anyhow::Context;
use std::collections::BTreeMap;
use tracing::error;

pub fn handle_build(args: &BuildArgs, config: &BuildConfiguration, dry_run: bool) -> i32 {
    let properties = match parse_properties(&args.properties) {
        Ok(properties) => properties,
        Err(err) => {
            eprintln!("forgebox: {:#}", err);
            return exit_codes::GENERAL;
        }
    };

    let request = BuildRequest {
        source_dir: args.source_dir.clone(),
        // Without -o the build happens in place.
        output_dir: args
            .output
            .clone()
            .unwrap_or_else(|| args.source_dir.clone()),
        intermediate_dir: args.intermediate_dir.clone(),
        platform_hint: args.platform.clone(),
        version_constraint: args
            .language_version
            .as_deref()
            .map(VersionConstraint::parse)
            .unwrap_or(VersionConstraint::Unspecified),
        properties,
        dry_run,
    };

    let orchestrator =
        BuildOrchestrator::new(config.clone(), PlatformRegistry::with_defaults());
    match orchestrator.run(&request) {
        Ok(outcome) => {
            if dry_run {
                print!("{}", outcome.script_text);
            } else {
                println!(
                    "Build succeeded: platform {} version {}",
                    outcome.resolved.platform, outcome.resolved.version
                );
            }
            exit_codes::SUCCESS
        }
        Err(err) => {
            error!(error = %err, "pipeline failed");
            eprintln!("forgebox: {}", err);
            err.exit_code()
        }
    }
}

pub fn handle_platforms(args: &PlatformsArgs, config: &BuildConfiguration) -> i32 {
    let registry = PlatformRegistry::with_defaults();
    let platform_ids = registry.platform_ids();
    let inventory = ToolchainInventory::scan(&config.toolchain_root, &platform_ids);

    match args.format {
        OutputFormatArg::Human => {
            for id in platform_ids {
                let platform = match registry.get(id) {
                    Some(p) => p,
                    None => continue,
                };
                let installed: Vec<String> = inventory
                    .versions(id)
                    .iter()
                    .map(|v| v.raw.clone())
                    .collect();
                let versions = if installed.is_empty() {
                    "(none installed)".to_string()
                } else {
                    installed.join(", ")
                };
                println!(
                    "{:<8} default {:<8} installed: {}",
                    platform.id(),
                    platform.default_version(),
                    versions
                );
            }
            exit_codes::SUCCESS
        }
        OutputFormatArg::Json => match platforms_json(&registry, &inventory) {
            Ok(text) => {
                println!("{}", text);
                exit_codes::SUCCESS
            }
            Err(err) => {
                eprintln!("forgebox: {:#}", err);
                exit_codes::GENERAL
            }
        },
    }
}

fn platforms_json(
    registry: &PlatformRegistry,
    inventory: &ToolchainInventory,
) -> anyhow::Result<String> {
    let mut platforms = serde_json::Map::new();
    for id in registry.platform_ids() {
        if let Some(platform) = registry.get(id) {
            let installed: Vec<String> = inventory
                .versions(id)
                .iter()
                .map(|v| v.raw.clone())
                .collect();
            platforms.insert(
                id.to_string(),
                serde_json::json!({
                    "default_version": platform.default_version(),
                    "installed_versions": installed,
                }),
            );
        }
    }
    serde_json::to_string_pretty(&serde_json::Value::Object(platforms))
        .context("serializing platform listing")
}

fn parse_properties(raw: &[String]) -> anyhow::Result<BTreeMap<String, String>> {
    let mut properties = BTreeMap::new();
    for item in raw {
        let (key, value) = item
            .split_once('=')
            .with_context(|| format!("invalid property '{}', expected KEY=VALUE", item))?;
        properties.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(properties)
}
