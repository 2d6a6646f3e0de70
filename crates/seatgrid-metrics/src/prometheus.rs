//! Prometheus text exposition format.

use crate::collector::{SeatWaitMetrics, BUCKET_BOUNDS};

/// Render the seat-wait histograms into Prometheus text format.
pub fn render_prometheus(metrics: &SeatWaitMetrics) -> String {
    let mut out = String::new();

    out.push_str("# HELP seatgrid_seat_wait_seconds Time proxies waited for a seat.\n");
    out.push_str("# TYPE seatgrid_seat_wait_seconds histogram\n");
    for snapshot in metrics.snapshot() {
        for (i, bound) in BUCKET_BOUNDS.iter().enumerate() {
            out.push_str(&format!(
                "seatgrid_seat_wait_seconds_bucket{{spec_id=\"{}\",le=\"{}\"}} {}\n",
                snapshot.spec_id, bound, snapshot.buckets[i]
            ));
        }
        out.push_str(&format!(
            "seatgrid_seat_wait_seconds_bucket{{spec_id=\"{}\",le=\"+Inf\"}} {}\n",
            snapshot.spec_id, snapshot.count
        ));
        out.push_str(&format!(
            "seatgrid_seat_wait_seconds_sum{{spec_id=\"{}\"}} {:.6}\n",
            snapshot.spec_id, snapshot.sum_seconds
        ));
        out.push_str(&format!(
            "seatgrid_seat_wait_seconds_count{{spec_id=\"{}\"}} {}\n",
            snapshot.spec_id, snapshot.count
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn render_empty_keeps_type_declarations() {
        let metrics = SeatWaitMetrics::new();
        let output = render_prometheus(&metrics);
        assert!(output.contains("# HELP seatgrid_seat_wait_seconds"));
        assert!(output.contains("# TYPE seatgrid_seat_wait_seconds histogram"));
    }

    #[test]
    fn render_single_spec() {
        let metrics = SeatWaitMetrics::new();
        metrics.record_seat_wait("01_hello", Duration::from_secs(2));

        let output = render_prometheus(&metrics);
        assert!(output.contains(
            "seatgrid_seat_wait_seconds_bucket{spec_id=\"01_hello\",le=\"2.5\"} 1"
        ));
        assert!(output.contains(
            "seatgrid_seat_wait_seconds_bucket{spec_id=\"01_hello\",le=\"+Inf\"} 1"
        ));
        assert!(output.contains("seatgrid_seat_wait_seconds_sum{spec_id=\"01_hello\"} 2.000000"));
        assert!(output.contains("seatgrid_seat_wait_seconds_count{spec_id=\"01_hello\"} 1"));
    }

    #[test]
    fn render_format_is_prometheus_compatible() {
        let metrics = SeatWaitMetrics::new();
        metrics.record_seat_wait("01_hello", Duration::from_millis(50));
        metrics.record_seat_wait("02_world", Duration::from_secs(9));

        let output = render_prometheus(&metrics);
        // Every non-empty, non-comment line is: metric_name{labels} value
        for line in output.lines() {
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            assert!(
                line.contains('{') && line.contains("} "),
                "line should have labels: {line}"
            );
        }
    }

    #[test]
    fn inf_bucket_counts_everything() {
        let metrics = SeatWaitMetrics::new();
        metrics.record_seat_wait("01_hello", Duration::from_secs(7200));

        let output = render_prometheus(&metrics);
        assert!(output.contains(
            "seatgrid_seat_wait_seconds_bucket{spec_id=\"01_hello\",le=\"1800\"} 0"
        ));
        assert!(output.contains(
            "seatgrid_seat_wait_seconds_bucket{spec_id=\"01_hello\",le=\"+Inf\"} 1"
        ));
    }
}
