// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

use crate::types::{RecordId, Step};

#[derive(Error, Debug)]
pub enum LeadtimeError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Ledger unavailable: {0}")]
    LedgerUnavailable(#[from] sqlx::Error),

    #[error("Ledger migration failed: {0}")]
    LedgerMigration(#[from] sqlx::migrate::MigrateError),

    #[error("Ledger record {id} is corrupt: {reason}")]
    CorruptRecord { id: RecordId, reason: String },

    #[error("Ledger has no record with id {0}")]
    UnknownRecord(RecordId),

    #[error("Invalid notification: {0}")]
    InvalidNotification(String),

    #[error("Processing failed for step {step}: {reason}")]
    ProcessingFailed { step: Step, reason: String },
}

impl LeadtimeError {
    /// True for storage-layer faults. These abort the current notification.
    pub fn is_ledger_fault(&self) -> bool {
        matches!(
            self,
            LeadtimeError::LedgerUnavailable(_)
                | LeadtimeError::LedgerMigration(_)
                | LeadtimeError::CorruptRecord { .. }
                | LeadtimeError::UnknownRecord(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, LeadtimeError>;
