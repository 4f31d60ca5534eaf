//! Core data models for the prediction client

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Raw sensor reading as received from a pond probe or an operator
///
/// pH may arrive under either `ph` or `ph_level`. Values are kept as the
/// JSON the caller supplied (numbers, numeric strings from DECIMAL
/// columns, explicit nulls). Nothing here is validated; the prediction
/// service decides what it accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ph: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub ph_level: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub turbidity: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub dissolved_oxygen: Option<Value>,
    #[serde(default, deserialize_with = "keep_null", skip_serializing_if = "Option::is_none")]
    pub pond_id: Option<Value>,
    /// Fields this crate does not know about, kept for batch forwarding
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A field that is present deserializes to `Some`, even when it is `null`
fn keep_null<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// Canonical body of a single prediction request
///
/// Built by [`crate::normalize`]; absent fields are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ph: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub turbidity: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dissolved_oxygen: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pond_id: Option<Value>,
}

/// Body of a batch prediction request
#[derive(Debug, Clone, Serialize)]
pub struct BatchRequest<'a> {
    pub readings: &'a [SensorReading],
}

/// Closed set of transport failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FailureKind {
    /// Nothing is listening at the service address
    ConnectionRefused,
    /// The call did not complete within its timeout
    TimedOut,
    /// The service answered with a non-2xx status
    HttpError { status: u16 },
    /// Any other transport problem (DNS, TLS, reset, malformed body)
    TransportOther,
}

impl FailureKind {
    /// Short stable label used in logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::ConnectionRefused => "connection_refused",
            FailureKind::TimedOut => "timed_out",
            FailureKind::HttpError { .. } => "http_error",
            FailureKind::TransportOther => "transport_other",
        }
    }

    /// Upstream status code, if the service answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            FailureKind::HttpError { status } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::HttpError { status } => write!(f, "http_error({})", status),
            other => f.write_str(other.as_str()),
        }
    }
}

/// Outcome of a single water quality prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PredictionResult {
    /// The service's `data` field, passed through untouched
    Success { payload: Value },
    Failure {
        kind: FailureKind,
        message: String,
        fallback_recommended: bool,
    },
}

impl PredictionResult {
    pub fn is_success(&self) -> bool {
        matches!(self, PredictionResult::Success { .. })
    }

    /// True when the caller should switch to its local classification
    pub fn fallback_recommended(&self) -> bool {
        match self {
            PredictionResult::Success { .. } => false,
            PredictionResult::Failure {
                fallback_recommended,
                ..
            } => *fallback_recommended,
        }
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            PredictionResult::Success { payload } => Some(payload),
            PredictionResult::Failure { .. } => None,
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PredictionResult::Success { .. } => None,
            PredictionResult::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Outcome of a batch prediction
///
/// Batch failures carry only a message, never a fallback flag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum BatchResult {
    Success { payload: Value },
    Failure { message: String },
}

impl BatchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, BatchResult::Success { .. })
    }

    pub fn payload(&self) -> Option<&Value> {
        match self {
            BatchResult::Success { payload } => Some(payload),
            BatchResult::Failure { .. } => None,
        }
    }
}

/// Status value reported for an unreachable or erroring service
pub const STATUS_UNHEALTHY: &str = "unhealthy";

/// Status value reported by a working service
pub const STATUS_HEALTHY: &str = "healthy";

/// Status shown when the service report carries no usable status
pub const STATUS_UNKNOWN: &str = "unknown";

/// Liveness report for the prediction service
///
/// On success this is the service's own JSON object, kept and serialized
/// back verbatim. On failure it is `{"status": "unhealthy", "error": <message>}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HealthStatus {
    report: Map<String, Value>,
}

impl HealthStatus {
    pub fn unhealthy(message: impl Into<String>) -> Self {
        let mut report = Map::new();
        report.insert("status".to_string(), Value::String(STATUS_UNHEALTHY.to_string()));
        report.insert("error".to_string(), Value::String(message.into()));
        Self { report }
    }

    /// Build a status from the service's health payload
    ///
    /// A payload that is not a JSON object is treated as an unhealthy service.
    pub fn from_report(report: Value) -> Self {
        match report {
            Value::Object(report) => Self { report },
            other => Self::unhealthy(format!("unexpected health payload: {}", other)),
        }
    }

    /// Reported status; `"unknown"` when the field is missing or not a string
    pub fn status(&self) -> &str {
        self.report
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or(STATUS_UNKNOWN)
    }

    /// The full report as received
    pub fn report(&self) -> &Map<String, Value> {
        &self.report
    }

    pub fn is_healthy(&self) -> bool {
        self.status() == STATUS_HEALTHY
    }

    /// Error message recorded for a failed probe
    pub fn error(&self) -> Option<&str> {
        self.report.get("error").and_then(Value::as_str)
    }
}
