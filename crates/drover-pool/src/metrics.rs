//! Lock-free per-worker metrics.

use std::sync::atomic::{AtomicU64, Ordering};

/// Per-worker counters updated on the gather path without locks.
#[derive(Debug, Default)]
pub struct WorkerMetrics {
    /// Total batches this worker emitted.
    pub tables: AtomicU64,
    /// Total rows across those batches.
    pub rows: AtomicU64,
    /// Total failed gathers.
    pub errors: AtomicU64,
    /// Latency of the most recent gather in nanoseconds.
    pub last_gather_ns: AtomicU64,
}

impl WorkerMetrics {
    /// Records a successful gather.
    pub fn record_gather(&self, rows: u64, latency_ns: u64) {
        self.tables.fetch_add(1, Ordering::Relaxed);
        self.rows.fetch_add(rows, Ordering::Relaxed);
        self.last_gather_ns.store(latency_ns, Ordering::Relaxed);
    }

    /// Records a failed gather.
    pub fn record_error(&self, latency_ns: u64) {
        self.errors.fetch_add(1, Ordering::Relaxed);
        self.last_gather_ns.store(latency_ns, Ordering::Relaxed);
    }

    /// Returns a snapshot of the current counters.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tables: self.tables.load(Ordering::Relaxed),
            rows: self.rows.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            last_gather_ns: self.last_gather_ns.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time snapshot of worker metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSnapshot {
    /// Total batches emitted.
    pub tables: u64,
    /// Total rows emitted.
    pub rows: u64,
    /// Total failed gathers.
    pub errors: u64,
    /// Last gather latency in nanoseconds. Per-worker; meaningless after
    /// merging snapshots, where it keeps the largest value seen.
    pub last_gather_ns: u64,
}

impl MetricsSnapshot {
    /// Folds another worker's snapshot into this one.
    pub fn merge(&mut self, other: &MetricsSnapshot) {
        self.tables += other.tables;
        self.rows += other.rows;
        self.errors += other.errors;
        self.last_gather_ns = self.last_gather_ns.max(other.last_gather_ns);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_snapshot() {
        let metrics = WorkerMetrics::default();
        metrics.record_gather(12, 1_500);
        metrics.record_gather(3, 900);
        metrics.record_error(2_000);

        let snap = metrics.snapshot();
        assert_eq!(snap.tables, 2);
        assert_eq!(snap.rows, 15);
        assert_eq!(snap.errors, 1);
        assert_eq!(snap.last_gather_ns, 2_000);
    }

    #[test]
    fn test_merge_sums_counters() {
        let mut total = MetricsSnapshot::default();
        total.merge(&MetricsSnapshot {
            tables: 2,
            rows: 10,
            errors: 1,
            last_gather_ns: 500,
        });
        total.merge(&MetricsSnapshot {
            tables: 3,
            rows: 1,
            errors: 0,
            last_gather_ns: 900,
        });

        assert_eq!(total.tables, 5);
        assert_eq!(total.rows, 11);
        assert_eq!(total.errors, 1);
        assert_eq!(total.last_gather_ns, 900);
    }
}
