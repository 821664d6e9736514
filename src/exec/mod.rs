// src/exec/mod.rs

//! Processing layer.
//!
//! - [`backend`] provides the `ProcessingBackend` trait and `ProcessJob`.
//! - [`command`] is the production backend that runs an external command
//!   through `tokio::process::Command`.
//! - [`dispatcher`] hands eligible sets to a backend and marks records
//!   processed after success.

pub mod backend;
pub mod command;
pub mod dispatcher;

pub use backend::{ProcessJob, ProcessingBackend};
pub use command::CommandBackend;
pub use dispatcher::{DispatchOutcome, Dispatcher};
