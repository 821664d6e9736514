// src/readiness/resolver.rs

use std::collections::HashMap;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::errors::{LeadtimeError, Result};
use crate::ledger::Ledger;
use crate::readiness::eligible::{BootstrapState, Deferral, DeferralReason, EligibleSet, Resolution};
use crate::types::{ArrivalRecord, Step};

/// Step alignment: only steps with `(step - tstart) % tincr == 0` are
/// processed, each depending on `step - tincr`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSettings {
    tincr: u32,
    tstart: u32,
}

impl TimeSettings {
    pub fn new(tincr: u32, tstart: u32) -> Result<Self> {
        if tincr == 0 {
            return Err(LeadtimeError::ConfigError(
                "tincr must be >= 1 (got 0)".to_string(),
            ));
        }
        Ok(Self { tincr, tstart })
    }

    pub fn tincr(&self) -> u32 {
        self.tincr
    }

    pub fn tstart(&self) -> u32 {
        self.tstart
    }

    /// Euclidean remainder, so steps before `tstart` align the same way as
    /// those after it.
    pub fn is_aligned(&self, step: Step) -> bool {
        (i64::from(step) - i64::from(self.tstart)).rem_euclid(i64::from(self.tincr)) == 0
    }

    /// `step - tincr`, or `None` when that would be negative.
    pub fn dependency_step(&self, step: Step) -> Option<Step> {
        step.checked_sub(self.tincr)
    }
}

/// Decides which steps of a run are ready to be processed.
///
/// Resolution is a pure function of the run's ledger records: "is step X
/// ready" can be answered at any time without side effects.
#[derive(Debug, Clone, Copy)]
pub struct Resolver {
    settings: TimeSettings,
}

impl Resolver {
    pub fn new(settings: TimeSettings) -> Self {
        Self { settings }
    }

    /// Read a run from the ledger and resolve it.
    pub async fn resolve_run(
        &self,
        ledger: &dyn Ledger,
        run_time: NaiveDateTime,
    ) -> Result<Resolution> {
        let records = ledger.records_for_run(run_time).await?;
        Ok(self.resolve(&records))
    }

    /// Compute the eligible sets for the records of one run.
    ///
    /// - Fewer than two step-zero records: nothing is eligible.
    /// - Each unprocessed, aligned, non-zero record is eligible once a record
    ///   for `step - tincr` exists (presence, not completion). A record of the
    ///   same stream is preferred; otherwise the earliest record at that step
    ///   is used. A dependency step of zero is satisfied by the bootstrap pair
    ///   itself.
    pub fn resolve(&self, records: &[ArrivalRecord]) -> Resolution {
        let mut sorted: Vec<&ArrivalRecord> = records.iter().collect();
        sorted.sort_by_key(|r| (r.step, r.id));

        let (zero, others): (Vec<&ArrivalRecord>, Vec<&ArrivalRecord>) =
            sorted.into_iter().partition(|r| r.is_step_zero());

        if zero.len() < 2 {
            info!(
                found = zero.len(),
                "waiting for step-zero files before processing"
            );
            return Resolution::insufficient(zero.len());
        }

        if zero.len() > 2 {
            warn!(
                found = zero.len(),
                ignored = ?zero[2..].iter().map(|r| r.key.as_str()).collect::<Vec<_>>(),
                "more than two step-zero files; using the two earliest as bootstrap pair"
            );
        }

        let run_time = zero[0].run_time;
        let bootstrap = [zero[0].clone(), zero[1].clone()];

        // First record per (step, stream), and per step regardless of stream.
        let mut by_stream: HashMap<(Step, &str), &ArrivalRecord> = HashMap::new();
        let mut by_step: HashMap<Step, &ArrivalRecord> = HashMap::new();
        for r in &others {
            by_stream.entry((r.step, r.stream.as_str())).or_insert(*r);
            by_step.entry(r.step).or_insert(*r);
        }

        let mut eligible = Vec::new();
        let mut deferred = Vec::new();

        for r in others.iter().filter(|r| !r.processed) {
            let defer = |reason| Deferral {
                record_id: r.id,
                step: r.step,
                key: r.key.clone(),
                reason,
            };

            if !self.settings.is_aligned(r.step) {
                debug!(step = r.step, key = %r.key, "step not aligned; skipping");
                deferred.push(defer(DeferralReason::Misaligned));
                continue;
            }

            let dependency_step = match self.settings.dependency_step(r.step) {
                Some(s) => s,
                None => {
                    debug!(step = r.step, key = %r.key, "no dependency step can exist");
                    deferred.push(defer(DeferralReason::Unreachable));
                    continue;
                }
            };

            if dependency_step == 0 {
                eligible.push(EligibleSet {
                    run_time,
                    bootstrap: bootstrap.clone(),
                    dependency: None,
                    current: (*r).clone(),
                });
                continue;
            }

            let dependency = by_stream
                .get(&(dependency_step, r.stream.as_str()))
                .or_else(|| by_step.get(&dependency_step));

            match dependency {
                Some(dep) => eligible.push(EligibleSet {
                    run_time,
                    bootstrap: bootstrap.clone(),
                    dependency: Some((*dep).clone()),
                    current: (*r).clone(),
                }),
                None => {
                    info!(
                        step = r.step,
                        dependency_step,
                        stream = %r.stream,
                        "step skipped, previous step not found"
                    );
                    deferred.push(defer(DeferralReason::MissingDependency { dependency_step }));
                }
            }
        }

        debug!(
            eligible = ?eligible.iter().map(EligibleSet::step).collect::<Vec<_>>(),
            deferred = deferred.len(),
            "resolution complete"
        );

        Resolution {
            bootstrap: BootstrapState::Ready,
            eligible,
            deferred,
        }
    }
}
