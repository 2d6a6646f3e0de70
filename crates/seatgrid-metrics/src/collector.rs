//! Seat-wait histogram collector.
//!
//! Records, per spec, how long proxies waited between arrival and seat
//! claim. Buckets span sub-second immediate claims up to the half-hour wait
//! ceiling.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use tracing::debug;

/// Upper bucket bounds in seconds.
pub const BUCKET_BOUNDS: [f64; 11] = [
    0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0, 1800.0,
];

/// One spec's accumulated histogram.
#[derive(Debug, Clone, PartialEq)]
pub struct SeatWaitSnapshot {
    pub spec_id: String,
    /// Cumulative counts per bucket bound, `+Inf` excluded.
    pub buckets: [u64; BUCKET_BOUNDS.len()],
    pub sum_seconds: f64,
    pub count: u64,
}

#[derive(Default)]
struct Histogram {
    buckets: [u64; BUCKET_BOUNDS.len()],
    sum_seconds: f64,
    count: u64,
}

impl Histogram {
    fn observe(&mut self, seconds: f64) {
        for (i, bound) in BUCKET_BOUNDS.iter().enumerate() {
            if seconds <= *bound {
                self.buckets[i] += 1;
            }
        }
        self.sum_seconds += seconds;
        self.count += 1;
    }
}

/// Records seat-wait latency per spec.
#[derive(Default)]
pub struct SeatWaitMetrics {
    histograms: Mutex<HashMap<String, Histogram>>,
}

impl SeatWaitMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one successful claim's wait time.
    pub fn record_seat_wait(&self, spec_id: &str, wait: Duration) {
        let seconds = wait.as_secs_f64();
        let mut histograms = self.histograms.lock().expect("metrics lock poisoned");
        histograms
            .entry(spec_id.to_string())
            .or_default()
            .observe(seconds);
        debug!(%spec_id, wait_seconds = seconds, "seat wait recorded");
    }

    /// Snapshot every spec's histogram, sorted by spec id.
    pub fn snapshot(&self) -> Vec<SeatWaitSnapshot> {
        let histograms = self.histograms.lock().expect("metrics lock poisoned");
        let mut snapshots: Vec<SeatWaitSnapshot> = histograms
            .iter()
            .map(|(spec_id, histogram)| SeatWaitSnapshot {
                spec_id: spec_id.clone(),
                buckets: histogram.buckets,
                sum_seconds: histogram.sum_seconds,
                count: histogram.count,
            })
            .collect();
        snapshots.sort_by(|a, b| a.spec_id.cmp(&b.spec_id));
        snapshots
    }
}
