//! Operation outcome metrics
//!
//! The store reports one outcome per operation call to an injected
//! [`StoreMetrics`] observer. Observers are fire-and-forget: recording
//! cannot fail and never influences the result of the operation.

use std::fmt::Display;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Store operations that report metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Create,
    Get,
    Delete,
}

impl StoreOp {
    /// All operations, in counter order
    pub const ALL: [StoreOp; 3] = [StoreOp::Create, StoreOp::Get, StoreOp::Delete];

    /// Lower-case operation name
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreOp::Create => "create",
            StoreOp::Get => "get",
            StoreOp::Delete => "delete",
        }
    }

    fn index(self) -> usize {
        match self {
            StoreOp::Create => 0,
            StoreOp::Get => 1,
            StoreOp::Delete => 2,
        }
    }
}

impl Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a store operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Success,
    Failure,
}

/// Observer of store operation outcomes
pub trait StoreMetrics: Send + Sync {
    /// Record one operation outcome
    fn record(&self, op: StoreOp, outcome: Outcome);
}

impl<M: StoreMetrics + ?Sized> StoreMetrics for Arc<M> {
    fn record(&self, op: StoreOp, outcome: Outcome) {
        (**self).record(op, outcome)
    }
}

/// Observer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopMetrics;

impl StoreMetrics for NoopMetrics {
    fn record(&self, _op: StoreOp, _outcome: Outcome) {}
}

/// Observer keeping a success and a failure counter per operation
#[derive(Debug, Default)]
pub struct CounterMetrics {
    success: [AtomicU64; 3],
    failure: [AtomicU64; 3],
}

impl CounterMetrics {
    /// Create a new set of zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of one counter
    pub fn count(&self, op: StoreOp, outcome: Outcome) -> u64 {
        let counters = match outcome {
            Outcome::Success => &self.success,
            Outcome::Failure => &self.failure,
        };
        counters[op.index()].load(Ordering::Relaxed)
    }

    /// Copy all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            job_config_create: self.count(StoreOp::Create, Outcome::Success),
            job_config_create_fail: self.count(StoreOp::Create, Outcome::Failure),
            job_config_get: self.count(StoreOp::Get, Outcome::Success),
            job_config_get_fail: self.count(StoreOp::Get, Outcome::Failure),
            job_config_delete: self.count(StoreOp::Delete, Outcome::Success),
            job_config_delete_fail: self.count(StoreOp::Delete, Outcome::Failure),
        }
    }
}

impl StoreMetrics for CounterMetrics {
    fn record(&self, op: StoreOp, outcome: Outcome) {
        let counters = match outcome {
            Outcome::Success => &self.success,
            Outcome::Failure => &self.failure,
        };
        counters[op.index()].fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`CounterMetrics`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub job_config_create: u64,
    pub job_config_create_fail: u64,
    pub job_config_get: u64,
    pub job_config_get_fail: u64,
    pub job_config_delete: u64,
    pub job_config_delete_fail: u64,
}

impl MetricsSnapshot {
    /// Sum of all counters
    pub fn total(&self) -> u64 {
        self.job_config_create
            + self.job_config_create_fail
            + self.job_config_get
            + self.job_config_get_fail
            + self.job_config_delete
            + self.job_config_delete_fail
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_start_at_zero() {
        let metrics = CounterMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
        assert_eq!(metrics.snapshot().total(), 0);
    }

    #[test]
    fn test_record_increments_matching_counter() {
        let metrics = CounterMetrics::new();
        metrics.record(StoreOp::Create, Outcome::Success);
        metrics.record(StoreOp::Create, Outcome::Failure);
        metrics.record(StoreOp::Create, Outcome::Failure);
        metrics.record(StoreOp::Delete, Outcome::Success);

        let snap = metrics.snapshot();
        assert_eq!(snap.job_config_create, 1);
        assert_eq!(snap.job_config_create_fail, 2);
        assert_eq!(snap.job_config_delete, 1);
        assert_eq!(snap.job_config_get, 0);
        assert_eq!(snap.total(), 4);
    }

    #[test]
    fn test_shared_through_arc() {
        let metrics = Arc::new(CounterMetrics::new());
        let observer: Arc<dyn StoreMetrics> = metrics.clone();
        observer.record(StoreOp::Get, Outcome::Success);

        assert_eq!(metrics.count(StoreOp::Get, Outcome::Success), 1);
    }

    #[test]
    fn test_concurrent_recording() {
        let metrics = Arc::new(CounterMetrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.record(StoreOp::Get, Outcome::Failure);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(metrics.count(StoreOp::Get, Outcome::Failure), 8000);
    }

    #[test]
    fn test_store_op_display() {
        let names: Vec<_> = StoreOp::ALL.iter().map(|op| op.to_string()).collect();
        assert_eq!(names, vec!["create", "get", "delete"]);
    }
}
