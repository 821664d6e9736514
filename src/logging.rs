// src/logging.rs

//! Logging for `leadtime`, written to stderr so stdout carries only
//! command output (reports, `status`, `check`).
//!
//! The level comes from `--log-level`, else `LEADTIME_LOG`, else `info`.
//!
//! Events carry structured fields rather than formatted text, so a run can
//! be followed with a plain `grep run_time=...`:
//!
//! | level | event | fields |
//! |-------|-------|--------|
//! | info  | notification received, arrival recorded, duplicate | `run_time`, `step`, `key`, `stream`, `record_id` |
//! | info  | waiting for step-zero files | `found` |
//! | info  | previous step not found | `step`, `dependency_step`, `stream` |
//! | info  | dispatching, step processed | `step`, `record_id`, `inputs`, `output_key` |
//! | warn  | extra step-zero files, dependency failed, mark lost a race | `step`, `record_id` |
//! | error | processing failed | `step`, `reason` |
//! | debug | misaligned or unreachable steps, command stderr | `step`, `key` |

use anyhow::Result;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

pub const LOG_ENV: &str = "LEADTIME_LOG";

/// Initialise global logging subscriber.
///
/// Safe to call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let level = resolve_level(cli_level, std::env::var(LOG_ENV).ok().as_deref());

    fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))?;

    Ok(())
}

pub fn resolve_level(cli_level: Option<LogLevel>, env_value: Option<&str>) -> tracing::Level {
    match cli_level {
        Some(lvl) => level_from_log_level(lvl),
        None => env_value
            .and_then(parse_level_str)
            .unwrap_or(tracing::Level::INFO),
    }
}

fn level_from_log_level(lvl: LogLevel) -> tracing::Level {
    match lvl {
        LogLevel::Error => tracing::Level::ERROR,
        LogLevel::Warn => tracing::Level::WARN,
        LogLevel::Info => tracing::Level::INFO,
        LogLevel::Debug => tracing::Level::DEBUG,
        LogLevel::Trace => tracing::Level::TRACE,
    }
}

fn parse_level_str(s: &str) -> Option<tracing::Level> {
    match s.trim().to_lowercase().as_str() {
        "error" => Some(tracing::Level::ERROR),
        "warn" | "warning" => Some(tracing::Level::WARN),
        "info" => Some(tracing::Level::INFO),
        "debug" => Some(tracing::Level::DEBUG),
        "trace" => Some(tracing::Level::TRACE),
        _ => None,
    }
}
