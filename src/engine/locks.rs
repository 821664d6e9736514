// src/engine/locks.rs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::NaiveDateTime;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// One async lock per run time.
///
/// Notifications for the same run are serialized; different runs proceed
/// independently. Entries nobody holds or waits on are dropped on the next
/// acquire.
#[derive(Debug, Default)]
pub struct RunLocks {
    runs: Mutex<HashMap<NaiveDateTime, Arc<AsyncMutex<()>>>>,
}

impl RunLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `run_time`.
    pub async fn acquire(&self, run_time: NaiveDateTime) -> OwnedMutexGuard<()> {
        let lock = {
            let mut runs = self.runs.lock().unwrap_or_else(|p| p.into_inner());
            // Only the map holds an idle entry.
            runs.retain(|rt, l| *rt == run_time || Arc::strong_count(l) > 1);
            Arc::clone(runs.entry(run_time).or_default())
        };
        lock.lock_owned().await
    }

    /// Number of runs currently tracked.
    pub fn tracked(&self) -> usize {
        self.runs.lock().unwrap_or_else(|p| p.into_inner()).len()
    }
}
