use std::sync::atomic::{AtomicU64, Ordering};

/// Counters shared by the enqueue path and the delivery worker
#[derive(Debug, Default)]
pub struct DispatcherStats {
    pub data_enqueued: AtomicU64,
    pub alerts_enqueued: AtomicU64,
    /// Events rejected because their queue was full
    pub dropped_full: AtomicU64,
    /// Events rejected because the backend was disconnected
    pub rejected_disconnected: AtomicU64,
    pub probes: AtomicU64,
    pub probe_failures: AtomicU64,
    pub delivered: AtomicU64,
    pub delivery_failures: AtomicU64,
}

impl DispatcherStats {
    pub fn snapshot(&self) -> DispatcherStatsSnapshot {
        DispatcherStatsSnapshot {
            data_enqueued: self.data_enqueued.load(Ordering::Relaxed),
            alerts_enqueued: self.alerts_enqueued.load(Ordering::Relaxed),
            dropped_full: self.dropped_full.load(Ordering::Relaxed),
            rejected_disconnected: self.rejected_disconnected.load(Ordering::Relaxed),
            probes: self.probes.load(Ordering::Relaxed),
            probe_failures: self.probe_failures.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Snapshot of dispatcher statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DispatcherStatsSnapshot {
    pub data_enqueued: u64,
    pub alerts_enqueued: u64,
    pub dropped_full: u64,
    pub rejected_disconnected: u64,
    pub probes: u64,
    pub probe_failures: u64,
    pub delivered: u64,
    pub delivery_failures: u64,
}

impl DispatcherStatsSnapshot {
    /// Events that never reached the backend after being offered
    pub fn total_dropped(&self) -> u64 {
        self.dropped_full + self.rejected_disconnected + self.delivery_failures
    }
}
