use forgebox::cli::commands::{CliArgs, Commands};
use forgebox::cli::handlers::{handle_build, handle_platforms};
use forgebox::config::BuildConfiguration;
use forgebox::util::logging::{init_logging, parse_level, LoggingConfig};
use forgebox::VERSION;

use clap::Parser;
use tracing::{debug, Level};

fn main() {
    let args = CliArgs::parse();
    init_logging_from_args(&args);

    debug!("forgebox v{} starting", VERSION);
    debug!("Arguments: {:?}", args);

    let mut config = BuildConfiguration::from_env();
    if let Some(root) = &args.toolchain_root {
        config.toolchain_root = root.clone();
    }

    let exit_code = match &args.command {
        Commands::Build(build_args) => handle_build(build_args, &config, false),
        Commands::Script(build_args) => handle_build(build_args, &config, true),
        Commands::Platforms(platforms_args) => handle_platforms(platforms_args, &config),
    };

    std::process::exit(exit_code);
}

fn init_logging_from_args(args: &CliArgs) {
    let level = if let Some(level_str) = &args.log_level {
        Some(parse_level(level_str))
    } else if args.verbose {
        Some(Level::DEBUG)
    } else if args.quiet {
        Some(Level::ERROR)
    } else {
        None
    };

    init_logging(LoggingConfig {
        level,
        use_json: false,
        log_file: args.log_file.clone(),
    });
}
