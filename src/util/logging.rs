//! Structured logging setup for forgebox.
//!
//! Initialization and configuration for structured logging using the
//! `tracing` ecosystem: console output by default, optional JSON output for
//! production environments, an optional log file, and `RUST_LOG`-style
//! filtering. Logs go to stderr so generated script text on stdout stays
//! clean for piping.

use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Once};
use tracing::Level;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Ensures logging is only initialized once
static INIT: Once = Once::new();

/// Configuration for logging initialization
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Minimum log level to display; `None` defers to environment defaults
    pub level: Option<Level>,

    /// Use JSON output format (for structured logging in production)
    pub use_json: bool,

    /// Also append logs to this file
    pub log_file: Option<PathBuf>,
}

/// Parses a log level from a string, defaulting to INFO on invalid input.
pub fn parse_level(level_str: &str) -> Level {
    match level_str.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to INFO. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::INFO
        }
    }
}

/// Initializes the logging system with the provided configuration.
///
/// Can only be called once; subsequent calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let level = config.level.unwrap_or_else(|| {
            let level_str =
                env::var("FORGEBOX_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
            parse_level(&level_str)
        });

        let mut filter = EnvFilter::from_default_env();
        if env::var("RUST_LOG").is_err() {
            filter = filter.add_directive(format!("forgebox={}", level).parse().unwrap());
        }

        let file_layer = config.log_file.as_ref().and_then(|path| {
            match File::create(path) {
                Ok(file) => Some(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(Arc::new(file))
                        .boxed(),
                ),
                Err(err) => {
                    eprintln!("Could not open log file {}: {}", path.display(), err);
                    None
                }
            }
        });

        let console_layer = if config.use_json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .boxed()
        };

        tracing_subscriber::registry()
            .with(filter)
            .with(console_layer)
            .with(file_layer)
            .init();
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("trace"), Level::TRACE);
        assert_eq!(parse_level("debug"), Level::DEBUG);
        assert_eq!(parse_level("info"), Level::INFO);
        assert_eq!(parse_level("warn"), Level::WARN);
        assert_eq!(parse_level("error"), Level::ERROR);
    }

    #[test]
    fn test_parse_level_case_insensitive() {
        assert_eq!(parse_level("TRACE"), Level::TRACE);
        assert_eq!(parse_level("Debug"), Level::DEBUG);
    }

    #[test]
    fn test_parse_level_invalid_defaults_to_info() {
        assert_eq!(parse_level("invalid"), Level::INFO);
        assert_eq!(parse_level(""), Level::INFO);
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert!(config.level.is_none());
        assert!(!config.use_json);
        assert!(config.log_file.is_none());
    }
}
