//! Rolling request metrics for the bulk query layer.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// Number of recent call latencies retained for averaging.
const LATENCY_WINDOW: usize = 100;

/// Point-in-time view of the aggregated metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Total remote calls issued.
    pub total_requests: u64,
    /// Remote calls that failed.
    pub failed_requests: u64,
    /// Average latency over the retained window, if any calls were made.
    pub average_latency: Option<Duration>,
}

/// Request counters plus a bounded ring of recent latencies.
///
/// All state sits behind a single mutex and is safe for concurrent
/// writers; the average is computed lazily when a snapshot is taken.
#[derive(Debug, Default)]
pub struct Metrics {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    total_requests: u64,
    failed_requests: u64,
    latencies: VecDeque<Duration>,
}

impl Metrics {
    /// Create an empty metrics aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one remote call and its latency.
    pub fn record(&self, latency: Duration, failed: bool) {
        let mut inner = self.inner.lock().expect("metrics lock poisoned");
        inner.total_requests += 1;
        if failed {
            inner.failed_requests += 1;
        }
        if inner.latencies.len() == LATENCY_WINDOW {
            inner.latencies.pop_front();
        }
        inner.latencies.push_back(latency);
    }

    /// Take a snapshot, computing the average latency on read.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().expect("metrics lock poisoned");
        let average_latency = if inner.latencies.is_empty() {
            None
        } else {
            let total: Duration = inner.latencies.iter().sum();
            Some(total / inner.latencies.len() as u32)
        };
        MetricsSnapshot {
            total_requests: inner.total_requests,
            failed_requests: inner.failed_requests,
            average_latency,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_snapshot() {
        let metrics = Metrics::new();
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 0);
        assert_eq!(snap.failed_requests, 0);
        assert!(snap.average_latency.is_none());
    }

    #[test]
    fn test_counts_and_average() {
        let metrics = Metrics::new();
        metrics.record(Duration::from_millis(10), false);
        metrics.record(Duration::from_millis(30), true);
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 2);
        assert_eq!(snap.failed_requests, 1);
        assert_eq!(snap.average_latency, Some(Duration::from_millis(20)));
    }

    #[test]
    fn test_latency_ring_is_bounded() {
        let metrics = Metrics::new();
        // 150 slow calls, then 100 fast ones: only the fast window remains.
        for _ in 0..150 {
            metrics.record(Duration::from_secs(10), false);
        }
        for _ in 0..LATENCY_WINDOW {
            metrics.record(Duration::from_millis(1), false);
        }
        let snap = metrics.snapshot();
        assert_eq!(snap.total_requests, 250);
        assert_eq!(snap.average_latency, Some(Duration::from_millis(1)));
    }

    #[test]
    fn test_concurrent_writers() {
        let metrics = std::sync::Arc::new(Metrics::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let m = std::sync::Arc::clone(&metrics);
                std::thread::spawn(move || {
                    for _ in 0..100 {
                        m.record(Duration::from_millis(5), false);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(metrics.snapshot().total_requests, 800);
    }
}
