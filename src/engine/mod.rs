// src/engine/mod.rs

//! Notification handling.
//!
//! This module ties together:
//! - the ledger (record the arrival)
//! - the resolver (which steps are ready)
//! - the dispatcher (process them, then mark them)
//!
//! under a per-run lock so concurrent notifications for one run never
//! dispatch the same step twice.

pub mod locks;
pub mod notifier;

pub use locks::RunLocks;
pub use notifier::{Notifier, NotifyReport, StepOutcome, StepReport};
