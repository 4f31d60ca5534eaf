//! Observability for the prediction client
//!
//! Provides:
//! - Prometheus metrics (request outcomes, latency, fallback signals)
//! - Structured diagnostics for failed calls

use crate::models::FailureKind;
use crate::transport::TransportFailure;
use prometheus::{
    register_histogram_vec, register_int_counter, register_int_counter_vec, Encoder, HistogramVec,
    IntCounter, IntCounterVec, TextEncoder,
};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Histogram buckets for request latency (in seconds), up to the batch timeout
const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
];

/// Outcome label for successful calls
pub const OUTCOME_SUCCESS: &str = "success";

/// Global metrics instance (registered once)
static GLOBAL_METRICS: OnceLock<ClientMetricsInner> = OnceLock::new();

struct ClientMetricsInner {
    requests_total: IntCounterVec,
    request_latency_seconds: HistogramVec,
    fallback_signals_total: IntCounter,
}

impl ClientMetricsInner {
    fn new() -> Self {
        Self {
            requests_total: register_int_counter_vec!(
                "wq_client_requests_total",
                "Prediction service calls by operation and outcome",
                &["operation", "outcome"]
            )
            .expect("Failed to register requests_total"),

            request_latency_seconds: register_histogram_vec!(
                "wq_client_request_latency_seconds",
                "Time spent waiting on the prediction service",
                &["operation"],
                LATENCY_BUCKETS.to_vec()
            )
            .expect("Failed to register request_latency_seconds"),

            fallback_signals_total: register_int_counter!(
                "wq_client_fallback_signals_total",
                "Single predictions that told the caller to use its fallback"
            )
            .expect("Failed to register fallback_signals_total"),
        }
    }
}

/// Handle to the process-wide client metrics
///
/// Clones share the same underlying metrics.
#[derive(Clone)]
pub struct ClientMetrics {
    _private: (),
}

impl Default for ClientMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientMetrics {
    pub fn new() -> Self {
        GLOBAL_METRICS.get_or_init(ClientMetricsInner::new);
        Self { _private: () }
    }

    fn inner(&self) -> &ClientMetricsInner {
        GLOBAL_METRICS.get_or_init(ClientMetricsInner::new)
    }

    /// Record one finished call
    pub fn observe_call(&self, operation: &str, outcome: &str, elapsed: Duration) {
        self.inner()
            .requests_total
            .with_label_values(&[operation, outcome])
            .inc();
        self.inner()
            .request_latency_seconds
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn inc_fallback_signals(&self) {
        self.inner().fallback_signals_total.inc();
    }

    pub fn requests(&self, operation: &str, outcome: &str) -> u64 {
        self.inner()
            .requests_total
            .with_label_values(&[operation, outcome])
            .get()
    }

    pub fn fallback_signals(&self) -> u64 {
        self.inner().fallback_signals_total.get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn gather_text(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
            warn!(error = %e, "Failed to encode metrics");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

/// Structured logger for prediction client events
#[derive(Debug, Clone)]
pub struct DiagnosticLogger {
    service_url: String,
}

impl DiagnosticLogger {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
        }
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    /// Log the configured service address
    pub fn log_configured(&self) {
        info!(
            event = "client_configured",
            service_url = %self.service_url,
            "Prediction service configured"
        );
    }

    /// Log a failed single prediction, with detail depending on the kind
    pub fn log_prediction_failure(&self, endpoint: &str, failure: &TransportFailure) {
        match failure.kind {
            FailureKind::ConnectionRefused => {
                error!(
                    event = "prediction_failed",
                    kind = failure.kind.as_str(),
                    service_url = %self.service_url,
                    endpoint = %endpoint,
                    "Cannot connect to prediction service; connection refused, is it running?"
                );
            }
            FailureKind::TimedOut => {
                error!(
                    event = "prediction_failed",
                    kind = failure.kind.as_str(),
                    service_url = %self.service_url,
                    endpoint = %endpoint,
                    detail = %failure.detail,
                    "Prediction service took too long to respond"
                );
            }
            FailureKind::HttpError { status } => {
                error!(
                    event = "prediction_failed",
                    kind = failure.kind.as_str(),
                    endpoint = %endpoint,
                    status = status,
                    response = failure.body.as_deref().unwrap_or(""),
                    "Prediction service returned an error status"
                );
            }
            FailureKind::TransportOther => {
                error!(
                    event = "prediction_failed",
                    kind = failure.kind.as_str(),
                    endpoint = %endpoint,
                    detail = %failure.detail,
                    "Prediction request failed"
                );
            }
        }
    }

    pub fn log_batch_failure(&self, endpoint: &str, batch_size: usize, failure: &TransportFailure) {
        error!(
            event = "batch_prediction_failed",
            kind = failure.kind.as_str(),
            endpoint = %endpoint,
            batch_size = batch_size,
            detail = %failure.detail,
            "Batch prediction failed"
        );
    }

    pub fn log_health_failure(&self, endpoint: &str, failure: &TransportFailure) {
        warn!(
            event = "health_check_failed",
            kind = failure.kind.as_str(),
            endpoint = %endpoint,
            detail = %failure.detail,
            "Prediction service health check failed"
        );
    }

    pub fn log_success(&self, operation: &str, endpoint: &str, elapsed: Duration) {
        debug!(
            event = "call_succeeded",
            operation = operation,
            endpoint = %endpoint,
            elapsed_ms = elapsed.as_millis() as u64,
            "Prediction service call succeeded"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_record_calls() {
        let metrics = ClientMetrics::new();
        let before = metrics.requests("metrics_test_op", OUTCOME_SUCCESS);

        metrics.observe_call("metrics_test_op", OUTCOME_SUCCESS, Duration::from_millis(12));
        metrics.observe_call("metrics_test_op", OUTCOME_SUCCESS, Duration::from_millis(30));

        assert_eq!(metrics.requests("metrics_test_op", OUTCOME_SUCCESS), before + 2);
    }

    #[test]
    fn test_metrics_handles_share_state() {
        let a = ClientMetrics::new();
        let b = a.clone();
        let before = b.fallback_signals();
        a.inc_fallback_signals();
        assert!(b.fallback_signals() > before);
    }

    #[test]
    fn test_gather_text_contains_client_metrics() {
        let metrics = ClientMetrics::new();
        metrics.observe_call("gather_test_op", "timed_out", Duration::from_millis(5));
        let text = metrics.gather_text();
        assert!(text.contains("wq_client_requests_total"));
    }

    #[test]
    fn test_diagnostic_logger_creation() {
        let logger = DiagnosticLogger::new("http://localhost:5002");
        assert_eq!(logger.service_url(), "http://localhost:5002");
    }
}
