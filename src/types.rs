// src/types.rs

//! Shared domain types: arrival records and the values the ledger stores.

use std::fmt;

use chrono::NaiveDateTime;

/// Format used to persist and display run times.
pub const RUN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Ledger-assigned record identifier.
pub type RecordId = i64;

/// Lead time in hours from the run time.
pub type Step = u32;

/// One file notification as stored in the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalRecord {
    pub id: RecordId,
    pub run_time: NaiveDateTime,
    pub step: Step,
    pub key: String,
    /// Explicit discriminator for same-step records (e.g. the dissemination
    /// stream letter).
    pub stream: String,
    pub processed: bool,
}

impl ArrivalRecord {
    /// Step-zero records are the bootstrap candidates of a run.
    pub fn is_step_zero(&self) -> bool {
        self.step == 0
    }

    /// Reference handed to the processing backend.
    pub fn file_ref(&self) -> FileRef {
        FileRef {
            run_time: self.run_time,
            step: self.step,
            key: self.key.clone(),
            stream: self.stream.clone(),
        }
    }
}

impl fmt::Display for ArrivalRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} step={} key={} stream={} processed={}",
            self.id,
            self.run_time.format(RUN_TIME_FORMAT),
            self.step,
            self.key,
            self.stream,
            self.processed
        )
    }
}

/// An arrival that has not been recorded yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewArrival {
    pub run_time: NaiveDateTime,
    pub step: Step,
    pub key: String,
    pub stream: String,
}

impl NewArrival {
    pub fn new(
        run_time: NaiveDateTime,
        step: Step,
        key: impl Into<String>,
        stream: impl Into<String>,
    ) -> Self {
        Self {
            run_time,
            step,
            key: key.into(),
            stream: stream.into(),
        }
    }
}

/// A reference to an input file (never its content).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRef {
    pub run_time: NaiveDateTime,
    pub step: Step,
    pub key: String,
    pub stream: String,
}
