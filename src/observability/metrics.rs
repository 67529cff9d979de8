//! Request metrics collection.
//!
//! # Responsibilities
//! - Count requests and errors, track latency, break counts down by status
//! - Expose a point-in-time snapshot for an exposition handler
//!
//! # Design Decisions
//! - An explicit collector instance injected through the registry, not a
//!   process-wide static
//! - Metric updates are cheap (atomic increments, concurrent status map)

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;

/// Explicit metrics collector. Register it as a singleton and inject it into
/// the access-log middleware and any handler that exposes it.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    requests_total: AtomicU64,
    errors_total: AtomicU64,
    latency_micros_total: AtomicU64,
    by_status: DashMap<u16, u64>,
}

/// Point-in-time view of the collected metrics.
#[derive(Debug, Serialize)]
pub struct MetricsSnapshot {
    pub requests_total: u64,
    pub errors_total: u64,
    pub latency_micros_total: u64,
    pub by_status: Vec<(u16, u64)>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completed request. Statuses >= 400 also count as errors.
    pub fn record(&self, status: u16, elapsed: Duration) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        self.latency_micros_total
            .fetch_add(elapsed.as_micros() as u64, Ordering::Relaxed);
        if status >= 400 {
            self.errors_total.fetch_add(1, Ordering::Relaxed);
        }
        *self.by_status.entry(status).or_insert(0) += 1;
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut by_status: Vec<(u16, u64)> = self
            .by_status
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect();
        by_status.sort_unstable();
        MetricsSnapshot {
            requests_total: self.requests_total.load(Ordering::Relaxed),
            errors_total: self.errors_total.load(Ordering::Relaxed),
            latency_micros_total: self.latency_micros_total.load(Ordering::Relaxed),
            by_status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_are_counted_separately() {
        let metrics = MetricsCollector::new();
        metrics.record(200, Duration::from_millis(3));
        metrics.record(404, Duration::from_millis(1));
        metrics.record(500, Duration::from_millis(2));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.requests_total, 3);
        assert_eq!(snapshot.errors_total, 2);
        assert_eq!(snapshot.by_status, vec![(200, 1), (404, 1), (500, 1)]);
        assert_eq!(snapshot.latency_micros_total, 6_000);
    }
}
