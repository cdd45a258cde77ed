use portable_atomic::{AtomicU64, Ordering};

/// Workload counters shared by every worker.
///
/// All updates are relaxed; the counters are only read for periodic
/// progress reports.
#[derive(Debug, Default)]
pub struct WorkloadStats {
    updates: AtomicU64,
    empty_scans: AtomicU64,
    inserts: AtomicU64,
}

/// Point-in-time copy of [`WorkloadStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub updates: u64,
    pub empty_scans: u64,
    pub inserts: u64,
}

impl WorkloadStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_update(&self) {
        self.updates.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty_scan(&self) {
        self.empty_scans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_insert(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            updates: self.updates.load(Ordering::Relaxed),
            empty_scans: self.empty_scans.load(Ordering::Relaxed),
            inserts: self.inserts.load(Ordering::Relaxed),
        }
    }
}

impl StatsSnapshot {
    /// Returns the per-counter difference since `earlier`.
    pub const fn since(&self, earlier: &Self) -> Self {
        Self {
            updates: self.updates.saturating_sub(earlier.updates),
            empty_scans: self.empty_scans.saturating_sub(earlier.empty_scans),
            inserts: self.inserts.saturating_sub(earlier.inserts),
        }
    }
}
