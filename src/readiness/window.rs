// src/readiness/window.rs

//! Downstream launch windows.
//!
//! A downstream model run starts every `tfreq_f` hours and consumes `tdelta`
//! hours of processed steps. Each valid time inside a window is served by the
//! most recent upstream run that covers it with a positive lead time.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use chrono::{Duration, NaiveDateTime, Timelike};
use tracing::{debug, info};

use crate::errors::{LeadtimeError, Result};
use crate::ledger::Ledger;
use crate::types::{RUN_TIME_FORMAT, Step};

/// Timing of downstream runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchSettings {
    /// Hours of input each downstream run consumes.
    pub tdelta: u32,
    /// Hours between downstream run start times.
    pub tfreq_f: u32,
    /// Hours between upstream run times.
    pub tfreq: u32,
    /// Hours between consumed valid times.
    pub tincr: u32,
}

impl LaunchSettings {
    pub fn new(tdelta: u32, tfreq_f: u32, tfreq: u32, tincr: u32) -> Result<Self> {
        for (name, value) in [
            ("tdelta", tdelta),
            ("tfreq_f", tfreq_f),
            ("tfreq", tfreq),
            ("tincr", tincr),
        ] {
            if value == 0 {
                return Err(LeadtimeError::ConfigError(format!(
                    "launch.{name} must be >= 1 (got 0)"
                )));
            }
        }
        if tdelta < tincr {
            return Err(LeadtimeError::ConfigError(format!(
                "launch.tdelta ({tdelta}) must be >= launch.tincr ({tincr})"
            )));
        }
        Ok(Self {
            tdelta,
            tfreq_f,
            tfreq,
            tincr,
        })
    }
}

/// An upstream `(run_time, step)` a window reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourceStep {
    pub run_time: NaiveDateTime,
    pub step: Step,
}

impl fmt::Display for SourceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+{:02}", self.run_time.format(RUN_TIME_FORMAT), self.step)
    }
}

/// Source serving valid time `time` when upstream runs come every `tfreq` hours.
///
/// A time that falls on a run boundary is taken from the previous run at lead
/// `tfreq` rather than from the boundary run at lead zero.
pub fn source_for(time: NaiveDateTime, tfreq: u32) -> SourceStep {
    let offset = time.hour() % tfreq;
    if offset != 0 {
        SourceStep {
            run_time: time - Duration::hours(i64::from(offset)),
            step: offset,
        }
    } else {
        SourceStep {
            run_time: time - Duration::hours(i64::from(tfreq)),
            step: tfreq,
        }
    }
}

/// Start times of the downstream runs whose input may include the valid time
/// `run_time + step`.
pub fn start_times(
    run_time: NaiveDateTime,
    step: Step,
    settings: &LaunchSettings,
) -> Vec<NaiveDateTime> {
    let lead = run_time + Duration::hours(i64::from(step));
    let lead_tmp = lead - Duration::hours(i64::from(settings.tdelta));
    let min_start = lead_tmp
        + Duration::hours(i64::from(settings.tfreq_f - lead_tmp.hour() % settings.tfreq_f));
    let max_start = lead - Duration::hours(i64::from(lead.hour() % settings.tfreq_f));

    let mut starts = Vec::new();
    let mut current = min_start;
    while current <= max_start {
        starts.push(current);
        current += Duration::hours(i64::from(settings.tfreq_f));
    }
    starts
}

/// One downstream run and the sources it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchWindow {
    pub start: NaiveDateTime,
    /// Last valid time consumed.
    pub end: NaiveDateTime,
    /// Sources in valid-time order.
    pub sources: Vec<SourceStep>,
}

/// Windows that the arrival of `(run_time, step)` may have completed.
pub fn plan(run_time: NaiveDateTime, step: Step, settings: &LaunchSettings) -> Vec<LaunchWindow> {
    start_times(run_time, step, settings)
        .into_iter()
        .map(|start| {
            let times: Vec<NaiveDateTime> = (0..settings.tdelta)
                .step_by(settings.tincr as usize)
                .map(|i| start + Duration::hours(i64::from(i)))
                .collect();
            let end = times.last().copied().unwrap_or(start);
            LaunchWindow {
                start,
                end,
                sources: times
                    .into_iter()
                    .map(|t| source_for(t, settings.tfreq))
                    .collect(),
            }
        })
        .collect()
}

/// Readiness of one window against the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStatus {
    pub window: LaunchWindow,
    /// Sources without a processed record.
    pub missing: Vec<SourceStep>,
}

impl WindowStatus {
    pub fn is_ready(&self) -> bool {
        self.missing.is_empty()
    }
}

impl fmt::Display for WindowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} .. {}: ",
            self.window.start.format(RUN_TIME_FORMAT),
            self.window.end.format(RUN_TIME_FORMAT)
        )?;
        if self.is_ready() {
            write!(f, "ready")
        } else {
            let missing: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
            write!(f, "missing {}", missing.join(", "))
        }
    }
}

/// Check every window's sources against the processed records in the ledger.
///
/// Each upstream run is read once.
pub async fn evaluate_windows(
    ledger: &dyn Ledger,
    windows: Vec<LaunchWindow>,
) -> Result<Vec<WindowStatus>> {
    let runs: BTreeSet<NaiveDateTime> = windows
        .iter()
        .flat_map(|w| w.sources.iter().map(|s| s.run_time))
        .collect();

    let mut processed: BTreeMap<NaiveDateTime, BTreeSet<Step>> = BTreeMap::new();
    for run_time in runs {
        let steps = ledger
            .records_for_run(run_time)
            .await?
            .into_iter()
            .filter(|r| r.processed)
            .map(|r| r.step)
            .collect();
        processed.insert(run_time, steps);
    }

    let statuses: Vec<WindowStatus> = windows
        .into_iter()
        .map(|window| {
            let missing = window
                .sources
                .iter()
                .filter(|s| {
                    !processed
                        .get(&s.run_time)
                        .is_some_and(|steps| steps.contains(&s.step))
                })
                .copied()
                .collect();
            WindowStatus { window, missing }
        })
        .collect();

    for status in &statuses {
        if status.is_ready() {
            info!(start = %status.window.start, end = %status.window.end, "launch window ready");
        } else {
            debug!(
                start = %status.window.start,
                missing = status.missing.len(),
                "launch window incomplete"
            );
        }
    }

    Ok(statuses)
}
