// src/exec/backend.rs

//! Pluggable processing backend.
//!
//! The dispatcher hands each eligible set to a `ProcessingBackend` instead of
//! spawning processes itself, so tests can swap in a fake that records jobs.
//!
//! - [`CommandBackend`](super::command::CommandBackend) runs an external
//!   command and is what the CLI uses.
//! - Tests provide their own backend that records jobs and fails on demand.

use std::future::Future;
use std::pin::Pin;

use chrono::NaiveDateTime;

use crate::errors::Result;
use crate::types::{FileRef, Step};

/// One processing invocation: references to the inputs, never their content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessJob {
    pub run_time: NaiveDateTime,
    pub step: Step,
    /// Bootstrap pair, then the dependency (if any), then the current file.
    pub inputs: Vec<FileRef>,
    /// Key the processed output is expected under.
    pub output_key: String,
}

impl ProcessJob {
    pub fn input_keys(&self) -> Vec<&str> {
        self.inputs.iter().map(|i| i.key.as_str()).collect()
    }
}

/// Trait abstracting how a step is processed.
///
/// Returning `Ok(())` means the output for the step exists; the dispatcher
/// marks the record processed only then.
pub trait ProcessingBackend: Send + Sync {
    fn process<'a>(
        &'a self,
        job: &'a ProcessJob,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;
}
