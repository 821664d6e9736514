// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Command-line arguments for `leadtime`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "leadtime",
    version,
    about = "Track forecast file arrivals and trigger per-step processing once its inputs are present.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `LEADTIME_CONFIG`, else `Leadtime.toml` in the current
    /// working directory.
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `LEADTIME_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Record an arrived file and process every step it made eligible.
    Notify(NotifyArgs),
    /// Re-resolve a run and process pending steps.
    Resume(RunArgs),
    /// Show a run's records and what is eligible, without processing.
    Status(StatusArgs),
    /// Check which downstream launch windows a processed step completed.
    Windows(WindowArgs),
    /// Parse and validate the config, print it, and exit.
    Check,
}

/// Identifies a run by date and hour.
#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// Run date, `YYYYMMDD`.
    #[arg(long, value_name = "YYYYMMDD")]
    pub date: String,

    /// Run hour, `HH`.
    #[arg(long, value_name = "HH")]
    pub time: String,
}

#[derive(Debug, Clone, Args)]
pub struct NotifyArgs {
    /// Location of the arrived file; its file name is the key.
    #[arg(long, value_name = "PATH")]
    pub location: String,

    /// Run date, `YYYYMMDD`. Without it the key is parsed for the run.
    #[arg(long, value_name = "YYYYMMDD", requires_all = ["time", "step"])]
    pub date: Option<String>,

    #[arg(long, value_name = "HH", requires_all = ["date", "step"])]
    pub time: Option<String>,

    #[arg(long, value_name = "N", requires_all = ["date", "time"])]
    pub step: Option<u32>,

    /// Stream discriminator; overrides the parsed stream.
    #[arg(long, value_name = "S")]
    pub stream: Option<String>,

    /// Reference year for keys that carry none. Default: current UTC year.
    #[arg(long, value_name = "YYYY")]
    pub year: Option<i32>,
}

#[derive(Debug, Clone, Args)]
pub struct StatusArgs {
    #[arg(long, value_name = "YYYYMMDD", requires = "time")]
    pub date: Option<String>,

    #[arg(long, value_name = "HH", requires = "date")]
    pub time: Option<String>,

    /// Number of recent runs to list when no run is given.
    #[arg(long, value_name = "N", default_value_t = 10)]
    pub limit: u32,
}

#[derive(Debug, Clone, Args)]
pub struct WindowArgs {
    #[command(flatten)]
    pub run: RunArgs,

    /// Processed step whose windows to check.
    #[arg(long, value_name = "N")]
    pub step: u32,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
