// src/keys.rs

//! Object keys of disseminated forecast files and of processed output.

use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, Timelike};
use regex::Regex;

use crate::errors::{LeadtimeError, Result};
use crate::types::Step;

/// `PP S MMDDHHMM MMDDHHMM D`: product prefix, stream letter, reference time,
/// valid time, trailing digit. Digits are ASCII only.
static DISSEMINATION_KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<prefix>[A-Z0-9]{2})(?P<stream>[A-Z])(?P<reference>[0-9]{8})(?P<valid>[0-9]{8})[0-9]$")
        .unwrap()
});

/// A parsed dissemination key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisseminationKey {
    pub prefix: String,
    pub stream: String,
    pub run_time: NaiveDateTime,
    pub valid_time: NaiveDateTime,
    pub step: Step,
    /// Step-zero file with a non-zero valid minute. Older dissemination
    /// setups used this to tell the constants file from the initial state.
    pub legacy_constants: bool,
}

impl DisseminationKey {
    /// Parse `key` with reference year `year`.
    ///
    /// Keys carry no year. The valid time is placed in the following year
    /// when its month is earlier than the reference month.
    pub fn parse(key: &str, year: i32) -> Result<Self> {
        let caps = DISSEMINATION_KEY.captures(key).ok_or_else(|| {
            LeadtimeError::InvalidNotification(format!("'{key}' is not a dissemination key"))
        })?;

        let run_time = month_day_time(key, &caps["reference"], year)?;
        let mut valid_time = month_day_time(key, &caps["valid"], year)?;
        if valid_time.month() < run_time.month() {
            valid_time = month_day_time(key, &caps["valid"], year + 1)?;
        }

        let minutes = (valid_time - run_time).num_minutes();
        if minutes < 0 {
            return Err(LeadtimeError::InvalidNotification(format!(
                "'{key}': valid time precedes reference time"
            )));
        }
        let step = Step::try_from(minutes / 60).map_err(|_| {
            LeadtimeError::InvalidNotification(format!("'{key}': lead time out of range"))
        })?;

        Ok(Self {
            prefix: caps["prefix"].to_string(),
            stream: caps["stream"].to_string(),
            run_time,
            valid_time,
            step,
            legacy_constants: step == 0 && valid_time.minute() != 0,
        })
    }
}

fn month_day_time(key: &str, digits: &str, year: i32) -> Result<NaiveDateTime> {
    let field = |range: std::ops::Range<usize>| {
        digits
            .get(range)
            .and_then(|d| d.parse::<u32>().ok())
            .unwrap_or(u32::MAX)
    };
    NaiveDate::from_ymd_opt(year, field(0..2), field(2..4))
        .and_then(|d| d.and_hms_opt(field(4..6), field(6..8), 0))
        .ok_or_else(|| {
            LeadtimeError::InvalidNotification(format!("'{key}': invalid date/time '{digits}'"))
        })
}

/// Key of the processed output for `run_time + step`, e.g. `dispf2024061803`.
pub fn output_key(run_time: NaiveDateTime, step: Step) -> String {
    let lead = run_time + Duration::hours(i64::from(step));
    format!("dispf{}", lead.format("%Y%m%d%H"))
}
