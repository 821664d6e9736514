#![allow(dead_code)]

use chrono::NaiveDateTime;
use leadtime::config::{
    ConfigFile, IngestSection, LaunchSection, LedgerSection, ProcessingSection, RawConfigFile,
    TimeSection,
};
use leadtime::types::{ArrivalRecord, NewArrival, Step};

use crate::run_at;

/// Builder for `ArrivalRecord`s fed straight into the resolver.
pub struct RecordBuilder {
    record: ArrivalRecord,
}

impl RecordBuilder {
    pub fn new(id: i64, step: Step) -> Self {
        Self {
            record: ArrivalRecord {
                id,
                run_time: run_at(0),
                step,
                key: format!("file-{id}-step-{step}"),
                stream: "oper".to_string(),
                processed: false,
            },
        }
    }

    pub fn run_time(mut self, run_time: NaiveDateTime) -> Self {
        self.record.run_time = run_time;
        self
    }

    pub fn key(mut self, key: &str) -> Self {
        self.record.key = key.to_string();
        self
    }

    pub fn stream(mut self, stream: &str) -> Self {
        self.record.stream = stream.to_string();
        self
    }

    pub fn processed(mut self) -> Self {
        self.record.processed = true;
        self
    }

    pub fn build(self) -> ArrivalRecord {
        self.record
    }
}

/// Shorthand for a default record.
pub fn record(id: i64, step: Step) -> ArrivalRecord {
    RecordBuilder::new(id, step).build()
}

/// Arrival on the default run (`2024-06-18 00:00`) and stream.
pub fn arrival(step: Step, key: &str) -> NewArrival {
    NewArrival::new(run_at(0), step, key, "oper")
}

pub fn arrival_on(run_time: NaiveDateTime, step: Step, key: &str, stream: &str) -> NewArrival {
    NewArrival::new(run_time, step, key, stream)
}

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new(tincr: u32) -> Self {
        Self {
            config: RawConfigFile {
                ledger: LedgerSection::default(),
                time: TimeSection { tincr, tstart: 0 },
                ingest: IngestSection::default(),
                processing: ProcessingSection::default(),
                launch: None,
            },
        }
    }

    pub fn tstart(mut self, tstart: u32) -> Self {
        self.config.time.tstart = tstart;
        self
    }

    pub fn db_location(mut self, location: &str) -> Self {
        self.config.ledger.db_location = location.to_string();
        self
    }

    pub fn cmd(mut self, cmd: &str) -> Self {
        self.config.processing.cmd = Some(cmd.to_string());
        self
    }

    pub fn timeout_secs(mut self, secs: u64) -> Self {
        self.config.processing.timeout_secs = Some(secs);
        self
    }

    pub fn launch(mut self, tdelta: u32, tfreq_f: u32, tfreq: u32, tincr: u32) -> Self {
        self.config.launch = Some(LaunchSection {
            tdelta,
            tfreq_f,
            tfreq,
            tincr,
        });
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
