//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem for structured logging with support for
//! both human-readable and JSON output formats.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `level` - Default filter directive when `RUST_LOG` is not set.
/// * `json_format` - If true, outputs structured JSON logs; otherwise pretty-printed.
///
/// # Notes
///
/// - Log output goes to stderr (stdout carries the run diagnostics)
/// - The RUST_LOG environment variable can override the log level
pub fn init(level: &str, json_format: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    if json_format {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

/// Initialize logging with settings from the `[logging]` config section.
///
/// `--verbose` raises the level to at least debug; `--json-logs` forces JSON.
pub fn init_from_config(
    config: &imgpipe_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
) {
    init(
        &effective_level(&config.logging.level, verbose_override),
        json_logs_override || config.logging.format == "json",
    );
}

fn effective_level(configured: &str, verbose: bool) -> String {
    if verbose && configured != "trace" {
        "debug".to_string()
    } else {
        configured.to_string()
    }
}
