//! Compilation metrics
//!
//! - Counters only
//! - Monotonic increase
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by every compiler built from one assembler
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    /// Offset-paged queries compiled
    queries_compiled: AtomicU64,
    /// Aggregate queries compiled
    aggregates_compiled: AtomicU64,
    /// Cursor-paged queries compiled
    cursor_queries_compiled: AtomicU64,
    /// Compilations that returned an error
    compilations_rejected: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment offset-paged queries compiled
    pub fn increment_queries_compiled(&self) {
        self.queries_compiled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment aggregate queries compiled
    pub fn increment_aggregates_compiled(&self) {
        self.aggregates_compiled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment cursor queries compiled
    pub fn increment_cursor_queries_compiled(&self) {
        self.cursor_queries_compiled.fetch_add(1, Ordering::Relaxed);
    }

    /// Increment rejected compilations
    pub fn increment_compilations_rejected(&self) {
        self.compilations_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_compiled: self.queries_compiled.load(Ordering::Relaxed),
            aggregates_compiled: self.aggregates_compiled.load(Ordering::Relaxed),
            cursor_queries_compiled: self.cursor_queries_compiled.load(Ordering::Relaxed),
            compilations_rejected: self.compilations_rejected.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub queries_compiled: u64,
    pub aggregates_compiled: u64,
    pub cursor_queries_compiled: u64,
    pub compilations_rejected: u64,
}

impl MetricsSnapshot {
    /// Total compilations attempted
    pub fn total(&self) -> u64 {
        self.queries_compiled
            + self.aggregates_compiled
            + self.cursor_queries_compiled
            + self.compilations_rejected
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_registry_has_zero_values() {
        let snapshot = MetricsRegistry::new().snapshot();
        assert_eq!(snapshot.total(), 0);
    }

    #[test]
    fn test_increment_counters() {
        let registry = MetricsRegistry::new();

        registry.increment_queries_compiled();
        registry.increment_queries_compiled();
        registry.increment_aggregates_compiled();
        registry.increment_cursor_queries_compiled();
        registry.increment_compilations_rejected();

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.queries_compiled, 2);
        assert_eq!(snapshot.aggregates_compiled, 1);
        assert_eq!(snapshot.cursor_queries_compiled, 1);
        assert_eq!(snapshot.compilations_rejected, 1);
        assert_eq!(snapshot.total(), 5);
    }

    #[test]
    fn test_snapshot_serializes() {
        let registry = MetricsRegistry::new();
        registry.increment_cursor_queries_compiled();

        let json = serde_json::to_value(registry.snapshot()).unwrap();
        assert_eq!(json["cursor_queries_compiled"], 1);
    }

    #[test]
    fn test_thread_safety() {
        use std::sync::Arc;
        use std::thread;

        let registry = Arc::new(MetricsRegistry::new());
        let mut handles = vec![];

        for _ in 0..8 {
            let reg = Arc::clone(&registry);
            handles.push(thread::spawn(move || {
                for _ in 0..100 {
                    reg.increment_queries_compiled();
                }
            }));
        }

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(registry.snapshot().queries_compiled, 800);
    }
}
