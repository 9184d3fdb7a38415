//! Metrics registry for mdao
//!
//! - Counters are monotonic; `records` is the only gauge
//! - Reset only when the engine is created
//! - Thread-safe but lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters of one engine
///
/// All counters use Relaxed atomics: each value is exact, but a snapshot
/// taken during concurrent writes is not a consistent cut across counters.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// put calls
    puts: AtomicU64,
    /// remove calls that removed a record
    removes: AtomicU64,
    /// find calls
    finds: AtomicU64,
    /// select calls
    selects: AtomicU64,
    /// selects planned as a disjunction union
    or_plans: AtomicU64,
    /// remove_all calls
    remove_alls: AtomicU64,
    /// alternatives registered after construction
    indexes_added: AtomicU64,
    /// Records currently stored
    records: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_puts(&self) {
        self.puts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removes(&self) {
        self.removes.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_finds(&self) {
        self.finds.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_selects(&self) {
        self.selects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_or_plans(&self) {
        self.or_plans.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_remove_alls(&self) {
        self.remove_alls.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_indexes_added(&self) {
        self.indexes_added.fetch_add(1, Ordering::Relaxed);
    }

    /// Set the current record count
    pub fn set_records(&self, count: u64) {
        self.records.store(count, Ordering::Relaxed);
    }

    /// Current record count
    pub fn records(&self) -> u64 {
        self.records.load(Ordering::Relaxed)
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            puts: self.puts.load(Ordering::Relaxed),
            removes: self.removes.load(Ordering::Relaxed),
            finds: self.finds.load(Ordering::Relaxed),
            selects: self.selects.load(Ordering::Relaxed),
            or_plans: self.or_plans.load(Ordering::Relaxed),
            remove_alls: self.remove_alls.load(Ordering::Relaxed),
            indexes_added: self.indexes_added.load(Ordering::Relaxed),
            records: self.records.load(Ordering::Relaxed),
        }
    }

    /// Get current snapshot of all metrics as JSON
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.snapshot()).unwrap_or_else(|_| "{}".to_string())
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub puts: u64,
    pub removes: u64,
    pub finds: u64,
    pub selects: u64,
    pub or_plans: u64,
    pub remove_alls: u64,
    pub indexes_added: u64,
    pub records: u64,
}
