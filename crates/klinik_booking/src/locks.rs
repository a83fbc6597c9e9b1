// --- File: crates/klinik_booking/src/locks.rs ---
use crate::normalize::SlotKey;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Per-slot async locks serializing read-check-write sequences on one slot.
///
/// Only covers this process; replicas sharing the spreadsheet can still race.
#[derive(Clone, Default)]
pub struct SlotLocks {
    inner: Arc<Mutex<HashMap<SlotKey, Arc<AsyncMutex<()>>>>>,
}

impl SlotLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`. The lock is released when the guard drops.
    pub async fn acquire(&self, key: SlotKey) -> OwnedMutexGuard<()> {
        let slot_lock = {
            let mut table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            // Entries nobody holds or waits on
            table.retain(|_, lock| Arc::strong_count(lock) > 1);
            table.entry(key).or_default().clone()
        };
        slot_lock.lock_owned().await
    }

    /// Number of slots currently locked or awaited.
    pub fn active(&self) -> usize {
        let table = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        table
            .values()
            .filter(|lock| Arc::strong_count(lock) > 1)
            .count()
    }
}
