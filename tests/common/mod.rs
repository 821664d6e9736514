#![allow(dead_code)]

use std::sync::Arc;

use leadtime::engine::Notifier;
use leadtime::ledger::{Ledger, SqliteLedger};
use leadtime::readiness::TimeSettings;

pub use leadtime_test_utils::builders::*;
pub use leadtime_test_utils::{FakeProcessor, init_tracing, memory_ledger, run_at, with_timeout};

/// Notifier over `ledger` and `fake` with `tstart = 0`.
pub fn notifier(ledger: &Arc<SqliteLedger>, fake: &FakeProcessor, tincr: u32) -> Notifier {
    let ledger: Arc<dyn Ledger> = ledger.clone();
    Notifier::new(
        ledger,
        Arc::new(fake.clone()),
        TimeSettings::new(tincr, 0).expect("valid time settings"),
    )
}
