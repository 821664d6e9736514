// src/exec/dispatcher.rs

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::{LeadtimeError, Result};
use crate::exec::backend::{ProcessJob, ProcessingBackend};
use crate::keys::output_key;
use crate::ledger::Ledger;
use crate::readiness::EligibleSet;

/// What a dispatch did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The backend succeeded and this call set the processed flag.
    Completed,
    /// The record was processed by someone else; the backend was not called
    /// (or its result was not the one that marked the record).
    AlreadyProcessed,
}

/// Hands eligible sets to the backend and records completion.
///
/// The processed flag is set strictly after the backend reports success, so
/// a failed or cancelled dispatch leaves the step eligible for a later pass.
#[derive(Clone)]
pub struct Dispatcher {
    ledger: Arc<dyn Ledger>,
    backend: Arc<dyn ProcessingBackend>,
}

impl Dispatcher {
    pub fn new(ledger: Arc<dyn Ledger>, backend: Arc<dyn ProcessingBackend>) -> Self {
        Self { ledger, backend }
    }

    pub fn job_for(set: &EligibleSet) -> ProcessJob {
        ProcessJob {
            run_time: set.run_time,
            step: set.step(),
            inputs: set.inputs().into_iter().map(|r| r.file_ref()).collect(),
            output_key: output_key(set.run_time, set.step()),
        }
    }

    pub async fn dispatch(&self, set: &EligibleSet) -> Result<DispatchOutcome> {
        let current = &set.current;

        // The resolution may be stale by the time we get here.
        match self.ledger.get(current.id).await? {
            Some(stored) if stored.processed => {
                info!(
                    record_id = current.id,
                    step = current.step,
                    "step already processed; skipping dispatch"
                );
                return Ok(DispatchOutcome::AlreadyProcessed);
            }
            Some(_) => {}
            None => return Err(LeadtimeError::UnknownRecord(current.id)),
        }

        let job = Self::job_for(set);
        info!(
            run_time = %set.run_time,
            step = job.step,
            record_id = current.id,
            inputs = ?job.input_keys(),
            output_key = %job.output_key,
            "dispatching step"
        );

        if let Err(err) = self.backend.process(&job).await {
            let reason = match err {
                LeadtimeError::ProcessingFailed { reason, .. } => reason,
                other => other.to_string(),
            };
            error!(step = job.step, record_id = current.id, %reason, "processing failed");
            return Err(LeadtimeError::ProcessingFailed {
                step: job.step,
                reason,
            });
        }

        if self.ledger.mark_processed(current.id).await? {
            info!(step = job.step, record_id = current.id, "step marked processed");
            Ok(DispatchOutcome::Completed)
        } else {
            warn!(
                step = job.step,
                record_id = current.id,
                "step was marked processed concurrently"
            );
            Ok(DispatchOutcome::AlreadyProcessed)
        }
    }
}
