//! Prediction client
//!
//! Wraps the transport with the three service operations. None of them
//! return an error: every transport failure is turned into a result value
//! the caller inspects to decide on its fallback path.

use crate::classify::{classify, failure_message};
use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::{BatchRequest, BatchResult, HealthStatus, PredictionResult, SensorReading};
use crate::normalize::normalize;
use crate::observability::{ClientMetrics, DiagnosticLogger, OUTCOME_SUCCESS};
use crate::policy::{CallPolicy, RetryPolicy};
use crate::transport::{HttpTransport, RawResponse, Transport, TransportFailure};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

pub const PREDICT_PATH: &str = "api/predict";
pub const BATCH_PATH: &str = "api/predict/batch";
pub const HEALTH_PATH: &str = "api/health";

/// Client for the water quality prediction service
///
/// Immutable after construction; clone it freely and share it across
/// request handlers.
#[derive(Clone)]
pub struct PredictionClient {
    transport: Arc<dyn Transport>,
    logger: DiagnosticLogger,
    metrics: ClientMetrics,
}

impl PredictionClient {
    /// Create a client talking HTTP to the configured service
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(config)?;
        let client = Self::with_transport(Arc::new(transport), &config.service_url);
        client.logger.log_configured();
        Ok(client)
    }

    /// Create a client from `ML_SERVICE_URL` (or the default address)
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::load()?)
    }

    /// Create a client over any transport
    pub fn with_transport(transport: Arc<dyn Transport>, service_url: &str) -> Self {
        Self {
            transport,
            logger: DiagnosticLogger::new(service_url),
            metrics: ClientMetrics::new(),
        }
    }

    pub fn service_url(&self) -> &str {
        self.logger.service_url()
    }

    pub fn metrics(&self) -> &ClientMetrics {
        &self.metrics
    }

    /// Predict water quality for one reading
    pub async fn predict_water_quality(&self, reading: &SensorReading) -> PredictionResult {
        let policy = CallPolicy::PREDICT;
        let started = Instant::now();

        let outcome = match encode(&normalize(reading)) {
            Ok(body) => self.execute(policy, Method::POST, PREDICT_PATH, Some(&body)).await,
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(response) => {
                self.record_success(policy, PREDICT_PATH, started);
                PredictionResult::Success {
                    payload: data_field(response),
                }
            }
            Err(failure) => {
                let endpoint = self.transport.endpoint(PREDICT_PATH);
                self.logger.log_prediction_failure(&endpoint, &failure);
                self.metrics
                    .observe_call(policy.operation, failure.kind.as_str(), started.elapsed());

                let classification = classify(&failure, &endpoint);
                if classification.fallback_recommended {
                    self.metrics.inc_fallback_signals();
                }
                classification.into()
            }
        }
    }

    /// Predict water quality for a sequence of readings in one call
    ///
    /// Readings are forwarded exactly as given; aliases are not resolved.
    pub async fn predict_batch(&self, readings: &[SensorReading]) -> BatchResult {
        let policy = CallPolicy::BATCH;
        let started = Instant::now();

        let outcome = match encode(&BatchRequest { readings }) {
            Ok(body) => self.execute(policy, Method::POST, BATCH_PATH, Some(&body)).await,
            Err(failure) => Err(failure),
        };

        match outcome {
            Ok(response) => {
                self.record_success(policy, BATCH_PATH, started);
                BatchResult::Success {
                    payload: data_field(response),
                }
            }
            Err(failure) => {
                let endpoint = self.transport.endpoint(BATCH_PATH);
                self.logger
                    .log_batch_failure(&endpoint, readings.len(), &failure);
                self.metrics
                    .observe_call(policy.operation, failure.kind.as_str(), started.elapsed());
                BatchResult::Failure {
                    message: failure_message(&failure),
                }
            }
        }
    }

    /// Probe the service; always returns a status
    pub async fn health_check(&self) -> HealthStatus {
        let policy = CallPolicy::HEALTH;
        let started = Instant::now();

        match self.execute(policy, Method::GET, HEALTH_PATH, None).await {
            Ok(response) => {
                self.record_success(policy, HEALTH_PATH, started);
                HealthStatus::from_report(response.body)
            }
            Err(failure) => {
                let endpoint = self.transport.endpoint(HEALTH_PATH);
                self.logger.log_health_failure(&endpoint, &failure);
                self.metrics
                    .observe_call(policy.operation, failure.kind.as_str(), started.elapsed());
                HealthStatus::unhealthy(failure_message(&failure))
            }
        }
    }

    async fn execute(
        &self,
        policy: CallPolicy,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> std::result::Result<RawResponse, TransportFailure> {
        match policy.retry {
            RetryPolicy::Never => {
                let attempt = self.transport.send(method, path, body, policy.timeout);
                match tokio::time::timeout(policy.timeout, attempt).await {
                    Ok(outcome) => outcome,
                    Err(_) => Err(TransportFailure::timed_out(policy.timeout)),
                }
            }
        }
    }

    fn record_success(&self, policy: CallPolicy, path: &str, started: Instant) {
        let elapsed = started.elapsed();
        self.metrics
            .observe_call(policy.operation, OUTCOME_SUCCESS, elapsed);
        self.logger
            .log_success(policy.operation, &self.transport.endpoint(path), elapsed);
    }
}

fn encode<T: Serialize>(body: &T) -> std::result::Result<Value, TransportFailure> {
    serde_json::to_value(body)
        .map_err(|e| TransportFailure::other(format!("failed to encode request body: {}", e)))
}

/// The service wraps its result in `{"data": ...}`; a missing field is null
fn data_field(response: RawResponse) -> Value {
    match response.body {
        Value::Object(mut map) => map.remove("data").unwrap_or(Value::Null),
        _ => Value::Null,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::FailureKind;
    use async_trait::async_trait;
    use serde_json::json;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Clone)]
    enum Script {
        Respond(std::result::Result<RawResponse, TransportFailure>),
        Hang,
    }

    #[derive(Debug, Clone)]
    struct Call {
        method: Method,
        path: String,
        body: Option<Value>,
        timeout: Duration,
    }

    struct MockTransport {
        script: Script,
        calls: Mutex<Vec<Call>>,
    }

    impl MockTransport {
        fn new(script: Script) -> Arc<Self> {
            Arc::new(Self {
                script,
                calls: Mutex::new(Vec::new()),
            })
        }

        fn ok(body: Value) -> Arc<Self> {
            Self::new(Script::Respond(Ok(RawResponse { status: 200, body })))
        }

        fn failing(failure: TransportFailure) -> Arc<Self> {
            Self::new(Script::Respond(Err(failure)))
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(
            &self,
            method: Method,
            path: &str,
            body: Option<&Value>,
            timeout: Duration,
        ) -> std::result::Result<RawResponse, TransportFailure> {
            self.calls.lock().unwrap().push(Call {
                method,
                path: path.to_string(),
                body: body.cloned(),
                timeout,
            });

            match &self.script {
                Script::Respond(result) => result.clone(),
                Script::Hang => std::future::pending().await,
            }
        }

        fn endpoint(&self, path: &str) -> String {
            format!("http://mock-ml:5002/{}", path)
        }
    }

    fn client(transport: Arc<MockTransport>) -> PredictionClient {
        PredictionClient::with_transport(transport, "http://mock-ml:5002")
    }

    fn sample_reading() -> SensorReading {
        SensorReading {
            ph: Some(json!(7.2)),
            temperature: Some(json!(28.5)),
            turbidity: Some(json!(15.3)),
            dissolved_oxygen: Some(json!(6.8)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_predict_sends_normalized_body() {
        let transport = MockTransport::ok(json!({"success": true, "data": {"quality": "good"}}));
        let reading = SensorReading {
            ph_level: Some(json!(6.9)),
            temperature: Some(json!(27.0)),
            pond_id: Some(json!(4)),
            ..Default::default()
        };

        client(transport.clone()).predict_water_quality(&reading).await;

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, Method::POST);
        assert_eq!(calls[0].path, PREDICT_PATH);
        assert_eq!(calls[0].timeout, Duration::from_millis(10_000));
        assert_eq!(
            calls[0].body,
            Some(json!({"ph": 6.9, "temperature": 27.0, "pond_id": 4}))
        );
    }

    #[tokio::test]
    async fn test_predict_returns_data_field() {
        let transport = MockTransport::ok(json!({
            "success": true,
            "data": {"quality": "good", "confidence": 0.92}
        }));

        let result = client(transport).predict_water_quality(&sample_reading()).await;

        assert_eq!(
            result,
            PredictionResult::Success {
                payload: json!({"quality": "good", "confidence": 0.92})
            }
        );
    }

    #[tokio::test]
    async fn test_predict_missing_data_is_null_payload() {
        let transport = MockTransport::ok(json!({"success": true}));
        let result = client(transport).predict_water_quality(&sample_reading()).await;
        assert_eq!(result.payload(), Some(&Value::Null));
    }

    #[tokio::test]
    async fn test_predict_failure_recommends_fallback() {
        for failure in [
            TransportFailure::connection_refused("connection refused"),
            TransportFailure::timed_out(Duration::from_millis(10_000)),
            TransportFailure::http_error(500, "boom"),
            TransportFailure::other("connection reset"),
        ] {
            let kind = failure.kind;
            let transport = MockTransport::failing(failure);
            let result = client(transport.clone())
                .predict_water_quality(&sample_reading())
                .await;

            assert_eq!(result.failure_kind(), Some(kind));
            assert!(result.fallback_recommended());
            assert_eq!(transport.calls().len(), 1, "exactly one attempt");
        }
    }

    #[tokio::test]
    async fn test_predict_failure_counts_fallback_signal() {
        let transport = MockTransport::failing(TransportFailure::connection_refused("refused"));
        let client = client(transport);
        let before = client.metrics().fallback_signals();

        client.predict_water_quality(&sample_reading()).await;

        assert!(client.metrics().fallback_signals() > before);
    }

    #[tokio::test]
    async fn test_batch_forwards_readings_as_is() {
        let transport = MockTransport::ok(json!({"data": [{"quality": "good"}]}));
        let readings = vec![SensorReading {
            ph_level: Some(json!(6.5)),
            ..Default::default()
        }];

        client(transport.clone()).predict_batch(&readings).await;

        let calls = transport.calls();
        assert_eq!(calls[0].path, BATCH_PATH);
        assert_eq!(calls[0].timeout, Duration::from_millis(30_000));
        assert_eq!(calls[0].body, Some(json!({"readings": [{"ph_level": 6.5}]})));
    }

    #[tokio::test]
    async fn test_batch_forwards_strings_and_nulls() {
        let transport = MockTransport::ok(json!({"data": []}));
        let raw = json!([
            {"ph_level": "7.20", "temperature": "28.50", "pond_id": 1},
            {"ph": null, "ph_level": 6.5}
        ]);
        let readings: Vec<SensorReading> = serde_json::from_value(raw.clone()).unwrap();

        client(transport.clone()).predict_batch(&readings).await;

        assert_eq!(transport.calls()[0].body, Some(json!({"readings": raw})));
    }

    #[tokio::test]
    async fn test_batch_failure_is_message_only() {
        let transport = MockTransport::failing(TransportFailure::timed_out(Duration::from_millis(
            30_000,
        )));

        let result = client(transport).predict_batch(&[sample_reading()]).await;

        assert_eq!(
            result,
            BatchResult::Failure {
                message: "timeout of 30000ms exceeded".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_health_returns_report_verbatim() {
        let report = json!({"status": "healthy", "version": "1.0.0"});
        let transport = MockTransport::ok(report.clone());

        let health = client(transport.clone()).health_check().await;

        assert!(health.is_healthy());
        assert_eq!(serde_json::to_value(&health).unwrap(), report);
        let calls = transport.calls();
        assert_eq!(calls[0].method, Method::GET);
        assert_eq!(calls[0].body, None);
        assert_eq!(calls[0].timeout, Duration::from_millis(5_000));
    }

    #[tokio::test]
    async fn test_health_never_fails() {
        for failure in [
            TransportFailure::connection_refused("connection refused"),
            TransportFailure::timed_out(Duration::from_millis(5_000)),
            TransportFailure::http_error(503, "down"),
            TransportFailure::other("tls handshake failed"),
        ] {
            let health = client(MockTransport::failing(failure)).health_check().await;
            assert_eq!(health.status(), "unhealthy");
            assert!(health.error().is_some_and(|e| !e.is_empty()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_hanging_transport_abandoned_at_policy_timeout() {
        let client = client(MockTransport::new(Script::Hang));

        let start = tokio::time::Instant::now();
        let result = client.predict_water_quality(&sample_reading()).await;
        assert_eq!(result.failure_kind(), Some(FailureKind::TimedOut));
        assert!(result.fallback_recommended());
        assert!(start.elapsed() <= Duration::from_millis(10_050));

        let start = tokio::time::Instant::now();
        let batch = client.predict_batch(&[sample_reading()]).await;
        assert_eq!(
            batch,
            BatchResult::Failure {
                message: "timeout of 30000ms exceeded".to_string()
            }
        );
        assert!(start.elapsed() <= Duration::from_millis(30_050));

        let start = tokio::time::Instant::now();
        let health = client.health_check().await;
        assert_eq!(health.status(), "unhealthy");
        assert!(start.elapsed() <= Duration::from_millis(5_050));
    }

    #[tokio::test]
    async fn test_operations_run_concurrently() {
        let transport = MockTransport::ok(json!({"status": "healthy", "data": []}));
        let client = client(transport.clone());
        let reading = sample_reading();

        let (single, batch, health) = tokio::join!(
            client.predict_water_quality(&reading),
            client.predict_batch(std::slice::from_ref(&reading)),
            client.health_check()
        );

        assert!(single.is_success());
        assert!(batch.is_success());
        assert!(health.is_healthy());
        assert_eq!(transport.calls().len(), 3);
    }
}
