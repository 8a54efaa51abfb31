use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Build script generator with automatic platform detection
#[derive(Parser, Debug)]
#[command(
    name = "forgebox",
    about = "Build script generator with automatic platform detection",
    version,
    long_about = "forgebox inspects a source tree, determines which platform it targets \
                  (nodejs, python, dotnet, php), resolves an installed toolchain version, \
                  and generates and runs a fail-fast build script for it."
)]
pub struct CliArgs {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, global = true, value_name = "LEVEL", help = "Set logging level")]
    pub log_level: Option<String>,

    #[arg(
        short = 'v',
        long,
        global = true,
        help = "Verbose output (debug-level logging)"
    )]
    pub verbose: bool,

    #[arg(
        short = 'q',
        long,
        global = true,
        conflicts_with = "verbose",
        help = "Quiet mode - suppress non-error output"
    )]
    pub quiet: bool,

    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Also write logs to this file"
    )]
    pub log_file: Option<PathBuf>,

    #[arg(
        long,
        global = true,
        value_name = "DIR",
        help = "Root directory of installed toolchains (default: /opt, or FORGEBOX_TOOLCHAIN_ROOT)"
    )]
    pub toolchain_root: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(
        about = "Detect the platform, generate the build script and run it",
        long_about = "Runs the full pipeline: detection, version resolution, script \
                      generation, execution, and manifest writing.\n\n\
                      Examples:\n  \
                      forgebox build ./app\n  \
                      forgebox build ./app -o /tmp/out -i /tmp/int\n  \
                      forgebox build ./app -l nodejs --language-version 10.14\n  \
                      forgebox build ./app -p compress_node_modules=tar-gz"
    )]
    Build(BuildArgs),

    #[command(
        about = "Generate the build script and print it without executing",
        long_about = "Runs detection, version resolution and script generation, then \
                      prints the script to stdout. Nothing is executed or written."
    )]
    Script(BuildArgs),

    #[command(about = "List supported platforms and installed toolchain versions")]
    Platforms(PlatformsArgs),
}

#[derive(Parser, Debug, Clone)]
pub struct BuildArgs {
    #[arg(value_name = "SOURCE_DIR", help = "Path to the source tree to build")]
    pub source_dir: PathBuf,

    #[arg(
        short = 'o',
        long = "output",
        value_name = "DIR",
        help = "Output directory (defaults to building in place)"
    )]
    pub output: Option<PathBuf>,

    #[arg(
        short = 'i',
        long = "intermediate-dir",
        value_name = "DIR",
        help = "Stage the source here before building, leaving the source tree untouched"
    )]
    pub intermediate_dir: Option<PathBuf>,

    #[arg(
        short = 'l',
        long = "platform",
        value_name = "PLATFORM",
        help = "Skip detection and use this platform (nodejs, python, dotnet, php)"
    )]
    pub platform: Option<String>,

    #[arg(
        long = "language-version",
        value_name = "VERSION",
        help = "Version constraint: exact (2.1.8), partial (2.1), or 'latest'"
    )]
    pub language_version: Option<String>,

    #[arg(
        short = 'p',
        long = "property",
        value_name = "KEY=VALUE",
        help = "Platform-specific build property; may be repeated"
    )]
    pub properties: Vec<String>,
}

#[derive(Parser, Debug, Clone)]
pub struct PlatformsArgs {
    #[arg(
        short = 'f',
        long,
        value_enum,
        default_value = "human",
        help = "Output format"
    )]
    pub format: OutputFormatArg,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormatArg {
    Human,
    Json,
}
