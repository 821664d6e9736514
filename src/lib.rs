// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod keys;
pub mod ledger;
pub mod logging;
pub mod readiness;
pub mod types;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, info};

use crate::cli::{CliArgs, Command, NotifyArgs, RunArgs, StatusArgs, WindowArgs};
use crate::config::{ConfigFile, load_and_validate, resolve_config_path};
use crate::engine::{Notifier, NotifyReport};
use crate::errors::LeadtimeError;
use crate::exec::CommandBackend;
use crate::keys::DisseminationKey;
use crate::ledger::{Ledger, SqliteLedger};
use crate::readiness::{Resolver, window};
use crate::types::{NewArrival, RUN_TIME_FORMAT};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the SQLite ledger
/// - the command backend and notifier
/// - the selected subcommand
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = resolve_config_path(args.config.clone());
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config from {}", config_path.display()))?;
    debug!(path = %config_path.display(), "config loaded");

    if let Command::Check = args.command {
        print_config(&cfg)?;
        return Ok(());
    }

    let ledger = SqliteLedger::open(&cfg.ledger.db_location, cfg.ledger.max_connections)
        .await
        .with_context(|| format!("opening ledger at {}", cfg.ledger.db_location))?;

    let result = match &args.command {
        Command::Notify(notify) => run_notify(&cfg, &ledger, notify).await,
        Command::Resume(run) => run_resume(&cfg, &ledger, run).await,
        Command::Status(status) => run_status(&cfg, &ledger, status).await,
        Command::Windows(win) => run_windows(&cfg, &ledger, win).await,
        Command::Check => Ok(()),
    };

    ledger.close().await;
    result
}

/// Parse `YYYYMMDD` and `HH` into a run time.
pub fn parse_run_time(date: &str, time: &str) -> crate::errors::Result<NaiveDateTime> {
    let invalid = || LeadtimeError::InvalidNotification(format!("invalid run '{date}' '{time}'"));
    let day = NaiveDate::parse_from_str(date, "%Y%m%d").map_err(|_| invalid())?;
    let hour: u32 = time.trim().parse().map_err(|_| invalid())?;
    day.and_hms_opt(hour, 0, 0).ok_or_else(invalid)
}

/// Build the arrival for `leadtime notify`.
///
/// Explicit `--date/--time/--step` win; otherwise the file name is parsed as
/// a dissemination key.
pub fn arrival_from_args(
    args: &NotifyArgs,
    default_stream: &str,
) -> crate::errors::Result<NewArrival> {
    let key = Path::new(&args.location)
        .file_name()
        .and_then(|n| n.to_str())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| {
            LeadtimeError::InvalidNotification(format!(
                "location '{}' has no file name",
                args.location
            ))
        })?
        .to_string();

    if let (Some(date), Some(time), Some(step)) = (&args.date, &args.time, args.step) {
        let run_time = parse_run_time(date, time)?;
        let stream = args.stream.clone().unwrap_or_else(|| default_stream.to_string());
        return Ok(NewArrival::new(run_time, step, key, stream));
    }

    let year = args.year.unwrap_or_else(|| Utc::now().year());
    let parsed = DisseminationKey::parse(&key, year)?;
    if parsed.legacy_constants {
        info!(key = %key, "step-zero key carries the legacy constants marker");
    }
    let stream = args.stream.clone().unwrap_or(parsed.stream);
    Ok(NewArrival::new(parsed.run_time, parsed.step, key, stream))
}

fn build_notifier(cfg: &ConfigFile, ledger: &SqliteLedger) -> Result<Notifier> {
    let cmd = cfg
        .processing
        .cmd
        .clone()
        .ok_or_else(|| anyhow!("[processing].cmd is required to process steps"))?;
    let backend = CommandBackend::new(cmd, cfg.processing_timeout());
    let ledger: Arc<dyn Ledger> = Arc::new(ledger.clone());
    Ok(Notifier::new(ledger, Arc::new(backend), cfg.time_settings()?))
}

fn finish(report: &NotifyReport) -> Result<()> {
    print!("{report}");
    if report.is_success() {
        Ok(())
    } else {
        Err(anyhow!(
            "run {} has failed or blocked steps",
            report.run_time.format(RUN_TIME_FORMAT)
        ))
    }
}

async fn run_notify(cfg: &ConfigFile, ledger: &SqliteLedger, args: &NotifyArgs) -> Result<()> {
    let arrival = arrival_from_args(args, &cfg.ingest.default_stream)?;
    let notifier = build_notifier(cfg, ledger)?;
    let report = notifier.notify(arrival).await?;
    finish(&report)
}

async fn run_resume(cfg: &ConfigFile, ledger: &SqliteLedger, args: &RunArgs) -> Result<()> {
    let run_time = parse_run_time(&args.date, &args.time)?;
    let notifier = build_notifier(cfg, ledger)?;
    let report = notifier.resume(run_time).await?;
    finish(&report)
}

async fn run_status(cfg: &ConfigFile, ledger: &SqliteLedger, args: &StatusArgs) -> Result<()> {
    let (Some(date), Some(time)) = (&args.date, &args.time) else {
        let runs = ledger.recent_runs(args.limit).await?;
        println!("recent runs ({}):", runs.len());
        for run_time in runs {
            println!("  {}", run_time.format(RUN_TIME_FORMAT));
        }
        return Ok(());
    };

    let run_time = parse_run_time(date, time)?;
    let records = ledger.records_for_run(run_time).await?;
    let resolution = Resolver::new(cfg.time_settings()?).resolve(&records);

    println!("run {}", run_time.format(RUN_TIME_FORMAT));
    println!("records ({}):", records.len());
    for record in &records {
        println!("  {record}");
    }
    println!("{}", resolution.bootstrap);
    println!("eligible steps: {:?}", resolution.eligible_steps());
    for deferral in &resolution.deferred {
        println!(
            "  step {} [{}] {}: {}",
            deferral.step, deferral.record_id, deferral.key, deferral.reason
        );
    }
    Ok(())
}

async fn run_windows(cfg: &ConfigFile, ledger: &SqliteLedger, args: &WindowArgs) -> Result<()> {
    let settings = cfg
        .launch_settings()?
        .ok_or_else(|| anyhow!("[launch] section is required for `windows`"))?;
    let run_time = parse_run_time(&args.run.date, &args.run.time)?;

    let processed = ledger
        .records_for_run(run_time)
        .await?
        .iter()
        .any(|r| r.step == args.step && r.processed);
    if !processed {
        println!(
            "step {} of run {} is not processed yet",
            args.step,
            run_time.format(RUN_TIME_FORMAT)
        );
        return Ok(());
    }

    let windows = window::plan(run_time, args.step, &settings);
    let statuses = window::evaluate_windows(ledger, windows).await?;
    println!("launch windows ({}):", statuses.len());
    for status in &statuses {
        println!("  {status}");
    }
    Ok(())
}

fn print_config(cfg: &ConfigFile) -> Result<()> {
    println!("leadtime config check");
    print!("{}", toml::to_string(cfg).context("rendering config")?);
    Ok(())
}
