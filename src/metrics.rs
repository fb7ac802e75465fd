use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};
use std::time::Instant;
use tracing::warn;

use crate::{error::ErrorKind, Result, TsdbError};

lazy_static! {
    pub static ref REQUEST_COUNTER: IntCounterVec = register_int_counter_vec!(
        "tsdb_client_requests_total",
        "Total number of requests sent to the TSDB server",
        &["operation"]
    ).unwrap();

    pub static ref REQUEST_ERRORS: IntCounterVec = register_int_counter_vec!(
        "tsdb_client_request_errors_total",
        "Total number of failed TSDB requests",
        &["operation", "kind"]
    ).unwrap();

    pub static ref REQUEST_DURATION: HistogramVec = register_histogram_vec!(
        "tsdb_client_request_duration_seconds",
        "TSDB request duration in seconds",
        &["operation"],
        vec![0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0]
    ).unwrap();
}

/// Counts a request on creation and records its duration when dropped.
pub struct RequestTimer {
    operation: &'static str,
    start: Instant,
}

impl RequestTimer {
    pub fn new(operation: &'static str) -> Self {
        REQUEST_COUNTER.with_label_values(&[operation]).inc();
        Self {
            operation,
            start: Instant::now(),
        }
    }
}

impl Drop for RequestTimer {
    fn drop(&mut self) {
        let duration = self.start.elapsed().as_secs_f64();
        REQUEST_DURATION
            .with_label_values(&[self.operation])
            .observe(duration);
    }
}

pub fn record_error(operation: &str, kind: ErrorKind) {
    REQUEST_ERRORS
        .with_label_values(&[operation, kind.as_str()])
        .inc();
}

/// Text exposition of every metric in the default registry.
pub fn gather_text() -> Result<String> {
    let mut buffer = Vec::new();
    TextEncoder::new()
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| {
            warn!("Failed to encode metrics: {}", e);
            TsdbError::Io(format!("Failed to encode metrics: {}", e))
        })?;
    String::from_utf8(buffer).map_err(|e| {
        warn!("Metrics exposition is not UTF-8: {}", e);
        TsdbError::Io(format!("Metrics exposition is not UTF-8: {}", e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_records_request() {
        let before = REQUEST_COUNTER.with_label_values(&["metrics_test"]).get();
        {
            let _timer = RequestTimer::new("metrics_test");
        }
        assert_eq!(REQUEST_COUNTER.with_label_values(&["metrics_test"]).get(), before + 1);
        assert!(
            REQUEST_DURATION
                .with_label_values(&["metrics_test"])
                .get_sample_count()
                >= 1
        );
    }

    #[test]
    fn test_gather_text_contains_counters() {
        record_error("metrics_test", ErrorKind::Remote);
        let text = gather_text().unwrap();
        assert!(text.contains("tsdb_client_request_errors_total"));
    }
}
