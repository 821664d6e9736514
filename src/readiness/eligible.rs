// src/readiness/eligible.rs

//! Resolution results: eligible input sets and deferred steps.

use std::fmt;

use chrono::NaiveDateTime;

use crate::types::{ArrivalRecord, RecordId, Step};

/// Whether a run has received its bootstrap pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    Ready,
    /// Fewer than two step-zero records are present.
    Insufficient { found: usize },
}

impl BootstrapState {
    pub fn is_ready(&self) -> bool {
        matches!(self, BootstrapState::Ready)
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapState::Ready => write!(f, "bootstrap pair present"),
            BootstrapState::Insufficient { found } => {
                write!(f, "only {found} of 2 step-zero files available")
            }
        }
    }
}

/// Why an unprocessed step is not eligible yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferralReason {
    /// `(step - tstart) % tincr != 0`; the step is never dispatched.
    Misaligned,
    /// `step - tincr` is negative, so no record can ever satisfy it.
    Unreachable,
    /// No record for the dependency step (with the same stream) exists yet.
    MissingDependency { dependency_step: Step },
}

impl fmt::Display for DeferralReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeferralReason::Misaligned => write!(f, "step is not aligned with tincr/tstart"),
            DeferralReason::Unreachable => write!(f, "step precedes the first dependency step"),
            DeferralReason::MissingDependency { dependency_step } => {
                write!(f, "waiting for step {dependency_step}")
            }
        }
    }
}

/// An unprocessed record that was not eligible in this resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deferral {
    pub record_id: RecordId,
    pub step: Step,
    pub key: String,
    pub reason: DeferralReason,
}

/// The minimal group of records handed to one processing dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EligibleSet {
    pub run_time: NaiveDateTime,
    /// The two step-zero records, earliest first.
    pub bootstrap: [ArrivalRecord; 2],
    /// Present only when the dependency step is not zero.
    pub dependency: Option<ArrivalRecord>,
    /// The record whose step this dispatch completes.
    pub current: ArrivalRecord,
}

impl EligibleSet {
    pub fn step(&self) -> Step {
        self.current.step
    }

    pub fn dependency_step(&self) -> Option<Step> {
        self.dependency.as_ref().map(|d| d.step)
    }

    /// Inputs in processing order: bootstrap pair, dependency, current.
    pub fn inputs(&self) -> Vec<&ArrivalRecord> {
        let mut inputs: Vec<&ArrivalRecord> = self.bootstrap.iter().collect();
        if let Some(dep) = &self.dependency {
            inputs.push(dep);
        }
        inputs.push(&self.current);
        inputs
    }
}

/// Outcome of resolving one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub bootstrap: BootstrapState,
    /// Eligible sets in ascending step order.
    pub eligible: Vec<EligibleSet>,
    pub deferred: Vec<Deferral>,
}

impl Resolution {
    pub fn insufficient(found: usize) -> Self {
        Self {
            bootstrap: BootstrapState::Insufficient { found },
            eligible: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn eligible_steps(&self) -> Vec<Step> {
        self.eligible.iter().map(EligibleSet::step).collect()
    }
}
