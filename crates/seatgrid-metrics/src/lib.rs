//! seatgrid-metrics — seat-wait latency recording and Prometheus text
//! exposition.

pub mod collector;
pub mod prometheus;

pub use collector::{SeatWaitMetrics, SeatWaitSnapshot};
pub use prometheus::render_prometheus;
