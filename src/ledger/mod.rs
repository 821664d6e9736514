// src/ledger/mod.rs

//! Persistent ledger of file arrivals.
//!
//! - [`Ledger`] is the narrow read/write interface the resolver, dispatcher
//!   and notifier are given. It is always injected, never global.
//! - [`sqlite`] holds the SQLite implementation used in production and tests.

pub mod sqlite;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::errors::Result;
use crate::types::{ArrivalRecord, NewArrival, RecordId};

pub use sqlite::SqliteLedger;

/// Result of [`Ledger::insert`].
///
/// A redelivered notification is an expected outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    /// A new record was appended.
    Inserted(ArrivalRecord),
    /// `(run_time, step, key)` was already known; the stored record is returned.
    AlreadyPresent(ArrivalRecord),
}

impl InsertOutcome {
    pub fn record(&self) -> &ArrivalRecord {
        match self {
            InsertOutcome::Inserted(r) | InsertOutcome::AlreadyPresent(r) => r,
        }
    }

    pub fn was_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// Append-only store of arrival records.
///
/// Every mutation is committed before the call returns.
#[async_trait]
pub trait Ledger: Send + Sync {
    /// Append a record, or return the existing one for the same natural key.
    async fn insert(&self, arrival: &NewArrival) -> Result<InsertOutcome>;

    /// All records of a run, ordered by step, ties broken by insertion order.
    async fn records_for_run(&self, run_time: NaiveDateTime) -> Result<Vec<ArrivalRecord>>;

    /// Fetch a single record by id.
    async fn get(&self, id: RecordId) -> Result<Option<ArrivalRecord>>;

    /// Set the processed flag.
    ///
    /// Returns `true` only for the call that flipped it; setting it again is
    /// a no-op returning `false`.
    async fn mark_processed(&self, id: RecordId) -> Result<bool>;
}
