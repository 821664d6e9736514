// src/config/model.rs

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::readiness::{LaunchSettings, TimeSettings};

/// Top-level configuration as read from a TOML file.
///
/// ```toml
/// [ledger]
/// db_location = "leadtime.db"
/// max_connections = 4
///
/// [time]
/// tincr = 3
/// tstart = 0
///
/// [ingest]
/// default_stream = "oper"
///
/// [processing]
/// cmd = "transform-step"
/// timeout_secs = 3600
///
/// [launch]
/// tdelta = 6
/// tfreq_f = 6
/// tfreq = 6
/// tincr = 1
/// ```
///
/// Only `[time]` is required.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub ledger: LedgerSection,

    pub time: TimeSection,

    #[serde(default)]
    pub ingest: IngestSection,

    #[serde(default)]
    pub processing: ProcessingSection,

    /// Enables downstream launch window checks.
    #[serde(default)]
    pub launch: Option<LaunchSection>,
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>` (see `validate.rs`), so
/// holders can rely on every invariant checked there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigFile {
    pub ledger: LedgerSection,
    pub time: TimeSection,
    pub ingest: IngestSection,
    pub processing: ProcessingSection,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub launch: Option<LaunchSection>,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(raw: RawConfigFile) -> Self {
        Self {
            ledger: raw.ledger,
            time: raw.time,
            ingest: raw.ingest,
            processing: raw.processing,
            launch: raw.launch,
        }
    }

    pub fn time_settings(&self) -> Result<TimeSettings> {
        TimeSettings::new(self.time.tincr, self.time.tstart)
    }

    pub fn launch_settings(&self) -> Result<Option<LaunchSettings>> {
        self.launch
            .as_ref()
            .map(|l| LaunchSettings::new(l.tdelta, l.tfreq_f, l.tfreq, l.tincr))
            .transpose()
    }

    pub fn processing_timeout(&self) -> Option<Duration> {
        self.processing.timeout_secs.map(Duration::from_secs)
    }
}

/// `[ledger]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LedgerSection {
    /// File path or `sqlite:` URI.
    #[serde(default = "default_db_location")]
    pub db_location: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_location() -> String {
    "leadtime.db".to_string()
}

fn default_max_connections() -> u32 {
    4
}

impl Default for LedgerSection {
    fn default() -> Self {
        Self {
            db_location: default_db_location(),
            max_connections: default_max_connections(),
        }
    }
}

/// `[time]` section: step alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TimeSection {
    /// Stride between processed steps, in hours.
    pub tincr: u32,

    /// First aligned step.
    #[serde(default)]
    pub tstart: u32,
}

/// `[ingest]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct IngestSection {
    /// Stream recorded when neither the CLI nor the key supplies one.
    #[serde(default = "default_stream")]
    pub default_stream: String,
}

fn default_stream() -> String {
    "oper".to_string()
}

impl Default for IngestSection {
    fn default() -> Self {
        Self {
            default_stream: default_stream(),
        }
    }
}

/// `[processing]` section.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct ProcessingSection {
    /// Shell command run per eligible step. Required to dispatch.
    #[serde(default)]
    pub cmd: Option<String>,

    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// `[launch]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct LaunchSection {
    pub tdelta: u32,
    pub tfreq_f: u32,
    pub tfreq: u32,
    pub tincr: u32,
}
