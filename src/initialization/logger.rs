//! Logger initialization.
//!
//! This module provides functions to initialize the logger with custom
//! formatting for applications embedding the audit engine.

use std::io::Write;

use colored::Colorize;
use log::LevelFilter;

use crate::config::LogFormat;

/// Initializes the logger with the specified level and format.
///
/// Configures `env_logger` with custom formatting. Supports both plain text
/// (with colors) and JSON formats for structured logging.
///
/// The logger reads from the `RUST_LOG` environment variable by default, but
/// the provided `level` parameter overrides it, so embedders keep explicit
/// control while `RUST_LOG=debug` still works for quick debugging.
///
/// # Arguments
///
/// * `level` - Minimum log level to display (overrides `RUST_LOG` if set)
/// * `format` - Log format (Plain or Json)
///
/// # Errors
///
/// Returns an error if the global logger was already initialized with an
/// incompatible configuration.
pub fn init_logger(level: LevelFilter, format: LogFormat) -> anyhow::Result<()> {
    let mut builder = env_logger::Builder::from_default_env();

    builder.filter_level(level);
    // Chatty dependencies stay at info unless explicitly raised
    builder.filter_module("html5ever", LevelFilter::Error);
    builder.filter_module("selectors", LevelFilter::Warn);
    builder.filter_module("reqwest", LevelFilter::Info);
    builder.filter_module("hyper", LevelFilter::Info);
    builder.filter_module("tag_audit", level);

    match format {
        LogFormat::Json => {
            builder.format(|buf, record| {
                writeln!(
                    buf,
                    "{{\"ts\":{},\"level\":\"{}\",\"target\":\"{}\",\"msg\":{}}}",
                    chrono::Utc::now().timestamp_millis(),
                    record.level(),
                    record.target(),
                    serde_json::to_string(&record.args().to_string())
                        .unwrap_or_else(|_| "\"\"".into())
                )
            });
        }
        LogFormat::Plain => {
            builder.format(|buf, record| {
                let level = record.level();
                let colored_level = match level {
                    log::Level::Error => level.to_string().red(),
                    log::Level::Warn => level.to_string().yellow(),
                    log::Level::Info => level.to_string().green(),
                    log::Level::Debug => level.to_string().blue(),
                    log::Level::Trace => level.to_string().purple(),
                };
                writeln!(
                    buf,
                    "{} [{}] {}",
                    record.target().cyan(),
                    colored_level,
                    record.args()
                )
            });
        }
    }

    // try_init() instead of init(): tests may initialize more than once
    builder.try_init().map_err(anyhow::Error::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logger_is_idempotent_enough_for_tests() {
        // First call may succeed or fail depending on test ordering; the
        // second must not panic either way.
        let _ = init_logger(LevelFilter::Debug, LogFormat::Plain);
        let _ = init_logger(LevelFilter::Info, LogFormat::Json);
    }
}
