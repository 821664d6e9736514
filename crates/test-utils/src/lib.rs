pub mod builders;
pub mod fake_processor;

use std::sync::{Arc, Once};

use chrono::{NaiveDate, NaiveDateTime};
use leadtime::ledger::SqliteLedger;
use tracing_subscriber::{EnvFilter, fmt};

pub use fake_processor::FakeProcessor;

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=leadtime=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 5-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(std::time::Duration::from_secs(5), f)
        .await
        .expect("Test timed out after 5 seconds")
}

/// Fresh single-connection in-memory ledger.
pub async fn memory_ledger() -> Arc<SqliteLedger> {
    Arc::new(
        SqliteLedger::open_in_memory()
            .await
            .expect("in-memory ledger should open"),
    )
}

/// `2024-06-18` at `hour:00`.
pub fn run_at(hour: u32) -> NaiveDateTime {
    datetime(2024, 6, 18, hour)
}

pub fn datetime(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .expect("valid test datetime")
}
