// src/engine/notifier.rs

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::engine::locks::RunLocks;
use crate::errors::{LeadtimeError, Result};
use crate::exec::{DispatchOutcome, Dispatcher, ProcessingBackend};
use crate::ledger::{InsertOutcome, Ledger};
use crate::readiness::{BootstrapState, DeferralReason, Resolver, TimeSettings};
use crate::types::{ArrivalRecord, NewArrival, RUN_TIME_FORMAT, RecordId, Step};

/// What happened to one step during a notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Processed and marked by this notification.
    Processed,
    /// Someone else processed it first.
    AlreadyProcessed,
    /// The backend failed; the record stays unprocessed.
    Failed { reason: String },
    /// Not dispatched because its dependency failed in this pass.
    Blocked { dependency_step: Step },
    /// Not eligible yet.
    Deferred(DeferralReason),
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepOutcome::Processed => write!(f, "processed"),
            StepOutcome::AlreadyProcessed => write!(f, "already processed"),
            StepOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            StepOutcome::Blocked { dependency_step } => {
                write!(f, "blocked: step {dependency_step} failed")
            }
            StepOutcome::Deferred(reason) => write!(f, "deferred: {reason}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub record_id: RecordId,
    pub key: String,
    pub outcome: StepOutcome,
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "step {:>3} [{}] {}: {}", self.step, self.record_id, self.key, self.outcome)
    }
}

/// Summary of one `notify` or `resume` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyReport {
    pub run_time: NaiveDateTime,
    /// The notified record (`None` for `resume`).
    pub record: Option<ArrivalRecord>,
    /// False when the notification was a redelivery.
    pub inserted: bool,
    pub bootstrap: BootstrapState,
    pub steps: Vec<StepReport>,
}

impl NotifyReport {
    /// False if any step failed or was blocked.
    pub fn is_success(&self) -> bool {
        !self.steps.iter().any(|s| {
            matches!(
                s.outcome,
                StepOutcome::Failed { .. } | StepOutcome::Blocked { .. }
            )
        })
    }

    pub fn processed_steps(&self) -> Vec<Step> {
        self.steps
            .iter()
            .filter(|s| s.outcome == StepOutcome::Processed)
            .map(|s| s.step)
            .collect()
    }

    pub fn outcome_of(&self, step: Step) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.step == step).map(|s| &s.outcome)
    }
}

impl fmt::Display for NotifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "run {}", self.run_time.format(RUN_TIME_FORMAT))?;
        if let Some(record) = &self.record {
            let how = if self.inserted { "recorded" } else { "duplicate" };
            writeln!(f, "  {how}: {record}")?;
        }
        writeln!(f, "  {}", self.bootstrap)?;
        if self.steps.is_empty() {
            writeln!(f, "  nothing to dispatch")?;
        }
        for step in &self.steps {
            writeln!(f, "  {step}")?;
        }
        Ok(())
    }
}

/// Entry point for file notifications.
///
/// Each call records the arrival, resolves its run and dispatches every
/// eligible step, holding the run's lock throughout.
pub struct Notifier {
    ledger: Arc<dyn Ledger>,
    resolver: Resolver,
    dispatcher: Dispatcher,
    locks: RunLocks,
}

impl Notifier {
    pub fn new(
        ledger: Arc<dyn Ledger>,
        backend: Arc<dyn ProcessingBackend>,
        settings: TimeSettings,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::new(Arc::clone(&ledger), backend),
            resolver: Resolver::new(settings),
            ledger,
            locks: RunLocks::new(),
        }
    }

    pub fn ledger(&self) -> &Arc<dyn Ledger> {
        &self.ledger
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Record an arrival and dispatch whatever it made eligible.
    pub async fn notify(&self, arrival: NewArrival) -> Result<NotifyReport> {
        if arrival.key.trim().is_empty() {
            return Err(LeadtimeError::InvalidNotification(
                "notification has an empty key".to_string(),
            ));
        }

        info!(
            run_time = %arrival.run_time,
            step = arrival.step,
            key = %arrival.key,
            stream = %arrival.stream,
            "notification received"
        );

        let _guard = self.locks.acquire(arrival.run_time).await;

        let (record, inserted) = match self.ledger.insert(&arrival).await? {
            InsertOutcome::Inserted(record) => {
                info!(record_id = record.id, step = record.step, key = %record.key, "arrival recorded");
                (record, true)
            }
            InsertOutcome::AlreadyPresent(record) => {
                info!(
                    record_id = record.id,
                    step = record.step,
                    key = %record.key,
                    "duplicate notification; record already present"
                );
                (record, false)
            }
        };

        let (bootstrap, steps) = self.process_run(arrival.run_time).await?;

        Ok(NotifyReport {
            run_time: arrival.run_time,
            record: Some(record),
            inserted,
            bootstrap,
            steps,
        })
    }

    /// Re-resolve a run and dispatch pending steps without a new arrival.
    pub async fn resume(&self, run_time: NaiveDateTime) -> Result<NotifyReport> {
        info!(%run_time, "resuming run");
        let _guard = self.locks.acquire(run_time).await;
        let (bootstrap, steps) = self.process_run(run_time).await?;
        Ok(NotifyReport {
            run_time,
            record: None,
            inserted: false,
            bootstrap,
            steps,
        })
    }

    /// Resolve once, then dispatch the eligible sets in ascending step order.
    ///
    /// Caller must hold the run lock.
    async fn process_run(
        &self,
        run_time: NaiveDateTime,
    ) -> Result<(BootstrapState, Vec<StepReport>)> {
        let resolution = self.resolver.resolve_run(self.ledger.as_ref(), run_time).await?;
        let mut reports = Vec::with_capacity(resolution.eligible.len() + resolution.deferred.len());

        // Records that failed (or were blocked) in this pass.
        let mut broken: HashSet<RecordId> = HashSet::new();

        for set in &resolution.eligible {
            let current = &set.current;
            let report = |outcome| StepReport {
                step: current.step,
                record_id: current.id,
                key: current.key.clone(),
                outcome,
            };

            if let Some(dep) = set.dependency.as_ref().filter(|d| broken.contains(&d.id)) {
                warn!(
                    step = current.step,
                    dependency_step = dep.step,
                    dependency = %dep.key,
                    "dependency failed in this pass; step blocked"
                );
                broken.insert(current.id);
                reports.push(report(StepOutcome::Blocked {
                    dependency_step: dep.step,
                }));
                continue;
            }

            let outcome = match self.dispatcher.dispatch(set).await {
                Ok(DispatchOutcome::Completed) => StepOutcome::Processed,
                Ok(DispatchOutcome::AlreadyProcessed) => StepOutcome::AlreadyProcessed,
                Err(LeadtimeError::ProcessingFailed { reason, .. }) => {
                    broken.insert(current.id);
                    StepOutcome::Failed { reason }
                }
                Err(err) => return Err(err),
            };
            reports.push(report(outcome));
        }

        for deferral in &resolution.deferred {
            debug!(step = deferral.step, key = %deferral.key, reason = %deferral.reason, "step deferred");
            reports.push(StepReport {
                step: deferral.step,
                record_id: deferral.record_id,
                key: deferral.key.clone(),
                outcome: StepOutcome::Deferred(deferral.reason),
            });
        }

        Ok((resolution.bootstrap, reports))
    }
}
