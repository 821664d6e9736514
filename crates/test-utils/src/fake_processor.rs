use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use leadtime::errors::{LeadtimeError, Result};
use leadtime::exec::{ProcessJob, ProcessingBackend};
use leadtime::types::Step;

/// A fake processing backend that:
/// - records every job it is handed
/// - fails the steps (or individual keys) it was told to fail
/// - optionally sleeps before answering, to widen race windows.
#[derive(Clone, Default)]
pub struct FakeProcessor {
    jobs: Arc<Mutex<Vec<ProcessJob>>>,
    failing: Arc<Mutex<HashSet<Step>>>,
    failing_keys: Arc<Mutex<HashSet<String>>>,
    delay: Option<Duration>,
}

impl FakeProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Make every job for `step` fail until [`heal`](Self::heal) is called.
    pub fn fail_step(&self, step: Step) {
        self.failing.lock().unwrap().insert(step);
    }

    /// Fail only jobs whose current record has `key`.
    pub fn fail_key(&self, key: &str) {
        self.failing_keys.lock().unwrap().insert(key.to_string());
    }

    pub fn heal(&self, step: Step) {
        self.failing.lock().unwrap().remove(&step);
    }

    pub fn jobs(&self) -> Vec<ProcessJob> {
        self.jobs.lock().unwrap().clone()
    }

    /// Steps of all jobs in call order.
    pub fn steps(&self) -> Vec<Step> {
        self.jobs.lock().unwrap().iter().map(|j| j.step).collect()
    }

    pub fn calls_for(&self, step: Step) -> usize {
        self.jobs
            .lock()
            .unwrap()
            .iter()
            .filter(|j| j.step == step)
            .count()
    }
}

impl ProcessingBackend for FakeProcessor {
    fn process<'a>(
        &'a self,
        job: &'a ProcessJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            self.jobs.lock().unwrap().push(job.clone());

            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }

            let current_key = job.inputs.last().map(|f| f.key.as_str()).unwrap_or_default();
            if self.failing.lock().unwrap().contains(&job.step)
                || self.failing_keys.lock().unwrap().contains(current_key)
            {
                return Err(LeadtimeError::ProcessingFailed {
                    step: job.step,
                    reason: format!("fake failure for step {}", job.step),
                });
            }
            Ok(())
        })
    }
}
