// src/ledger/sqlite.rs

//! SQLite-backed ledger using sqlx.
//!
//! File databases run in WAL mode with `synchronous = FULL`, so a committed
//! insert or mark survives a crash of the process that made it.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::FromRow;
use tracing::{debug, info, warn};

use crate::errors::{LeadtimeError, Result};
use crate::ledger::{InsertOutcome, Ledger};
use crate::types::{ArrivalRecord, NewArrival, RecordId, RUN_TIME_FORMAT};

/// Busy timeout when another connection (or process) holds the write lock.
const BUSY_TIMEOUT_MS: u64 = 30_000;

const SELECT_COLUMNS: &str = "SELECT id, run_time, step, key, stream, processed FROM arrivals";

/// Raw row of the `arrivals` table.
#[derive(Debug, FromRow)]
struct ArrivalRow {
    id: i64,
    run_time: String,
    step: i64,
    key: String,
    stream: String,
    processed: bool,
}

impl TryFrom<ArrivalRow> for ArrivalRecord {
    type Error = LeadtimeError;

    fn try_from(row: ArrivalRow) -> Result<Self> {
        let run_time = NaiveDateTime::parse_from_str(&row.run_time, RUN_TIME_FORMAT).map_err(
            |e| LeadtimeError::CorruptRecord {
                id: row.id,
                reason: format!("unparseable run_time '{}': {e}", row.run_time),
            },
        )?;
        let step = u32::try_from(row.step).map_err(|_| LeadtimeError::CorruptRecord {
            id: row.id,
            reason: format!("step {} out of range", row.step),
        })?;

        Ok(ArrivalRecord {
            id: row.id,
            run_time,
            step,
            key: row.key,
            stream: row.stream,
            processed: row.processed,
        })
    }
}

fn format_run_time(run_time: NaiveDateTime) -> String {
    run_time.format(RUN_TIME_FORMAT).to_string()
}

/// Ledger stored in a SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteLedger {
    pool: SqlitePool,
}

impl SqliteLedger {
    /// Open (creating if missing) the ledger at `location` and apply migrations.
    ///
    /// `location` is either a filesystem path or a `sqlite:` URI.
    /// `":memory:"` is routed to [`SqliteLedger::open_in_memory`].
    pub async fn open(location: &str, max_connections: u32) -> Result<Self> {
        if location == ":memory:" || location == "sqlite::memory:" {
            return Self::open_in_memory().await;
        }

        let base = if location.starts_with("sqlite:") {
            SqliteConnectOptions::from_str(location)?
        } else {
            SqliteConnectOptions::new().filename(location)
        };
        let options = base
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Full)
            .busy_timeout(Duration::from_millis(BUSY_TIMEOUT_MS));

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections.max(1))
            .acquire_timeout(Duration::from_secs(30))
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;

        info!(location, max_connections, "ledger opened");
        Ok(ledger)
    }

    /// Open a private in-memory ledger.
    ///
    /// Every SQLite connection to `:memory:` is a separate database, so the
    /// pool is pinned to a single connection that is never recycled.
    pub async fn open_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        let ledger = Self { pool };
        ledger.migrate().await?;

        debug!("in-memory ledger opened");
        Ok(ledger)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Distinct run times, newest first.
    pub async fn recent_runs(&self, limit: u32) -> Result<Vec<NaiveDateTime>> {
        let rows = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT run_time FROM arrivals ORDER BY run_time DESC LIMIT ?",
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|s| {
                NaiveDateTime::parse_from_str(s, RUN_TIME_FORMAT).map_err(|e| {
                    LeadtimeError::CorruptRecord {
                        id: 0,
                        reason: format!("unparseable run_time '{s}': {e}"),
                    }
                })
            })
            .collect()
    }

    /// Close all pooled connections.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn find_by_natural_key(&self, arrival: &NewArrival) -> Result<Option<ArrivalRecord>> {
        let row = sqlx::query_as::<_, ArrivalRow>(&format!(
            "{SELECT_COLUMNS} WHERE run_time = ? AND step = ? AND key = ?"
        ))
        .bind(format_run_time(arrival.run_time))
        .bind(i64::from(arrival.step))
        .bind(&arrival.key)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ArrivalRecord::try_from).transpose()
    }
}

#[async_trait]
impl Ledger for SqliteLedger {
    async fn insert(&self, arrival: &NewArrival) -> Result<InsertOutcome> {
        let result = sqlx::query(
            r#"
            INSERT INTO arrivals (run_time, step, key, stream, processed)
            VALUES (?, ?, ?, ?, 0)
            "#,
        )
        .bind(format_run_time(arrival.run_time))
        .bind(i64::from(arrival.step))
        .bind(&arrival.key)
        .bind(&arrival.stream)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let record = ArrivalRecord {
                    id: done.last_insert_rowid(),
                    run_time: arrival.run_time,
                    step: arrival.step,
                    key: arrival.key.clone(),
                    stream: arrival.stream.clone(),
                    processed: false,
                };
                debug!(record_id = record.id, key = %record.key, "arrival inserted");
                Ok(InsertOutcome::Inserted(record))
            }
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                let existing = self.find_by_natural_key(arrival).await?.ok_or_else(|| {
                    LeadtimeError::InvalidNotification(format!(
                        "unique violation for key '{}' but no stored record found",
                        arrival.key
                    ))
                })?;
                Ok(InsertOutcome::AlreadyPresent(existing))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn records_for_run(&self, run_time: NaiveDateTime) -> Result<Vec<ArrivalRecord>> {
        let rows = sqlx::query_as::<_, ArrivalRow>(&format!(
            "{SELECT_COLUMNS} WHERE run_time = ? ORDER BY step ASC, id ASC"
        ))
        .bind(format_run_time(run_time))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ArrivalRecord::try_from).collect()
    }

    async fn get(&self, id: RecordId) -> Result<Option<ArrivalRecord>> {
        let row = sqlx::query_as::<_, ArrivalRow>(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(ArrivalRecord::try_from).transpose()
    }

    async fn mark_processed(&self, id: RecordId) -> Result<bool> {
        let done = sqlx::query("UPDATE arrivals SET processed = 1 WHERE id = ? AND processed = 0")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if done.rows_affected() == 1 {
            info!(record_id = id, "record marked as processed");
            return Ok(true);
        }

        let exists = sqlx::query_scalar::<_, i64>("SELECT id FROM arrivals WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match exists {
            Some(_) => {
                debug!(record_id = id, "record was already processed");
                Ok(false)
            }
            None => {
                warn!(record_id = id, "no record found to mark as processed");
                Err(LeadtimeError::UnknownRecord(id))
            }
        }
    }
}
