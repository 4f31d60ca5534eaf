//! Transport failure classification

use crate::models::{FailureKind, PredictionResult};
use crate::transport::TransportFailure;
use serde::Serialize;

/// Caller-facing view of a transport failure
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub kind: FailureKind,
    pub message: String,
    pub fallback_recommended: bool,
}

impl From<Classification> for PredictionResult {
    fn from(c: Classification) -> Self {
        PredictionResult::Failure {
            kind: c.kind,
            message: c.message,
            fallback_recommended: c.fallback_recommended,
        }
    }
}

/// Classify a failed single prediction call against `endpoint`
///
/// Every kind the transport can produce means the service is unreachable
/// or erroring, so all of them recommend the fallback path.
pub fn classify(failure: &TransportFailure, endpoint: &str) -> Classification {
    let message = match failure.kind {
        FailureKind::ConnectionRefused => format!(
            "prediction service unreachable at {}: connection refused",
            endpoint
        ),
        FailureKind::TimedOut => format!(
            "prediction service at {} exceeded the timeout budget: {}",
            endpoint, failure.detail
        ),
        FailureKind::HttpError { status } => match non_empty(&failure.body) {
            Some(body) => format!(
                "prediction service at {} returned status {}: {}",
                endpoint, status, body
            ),
            None => format!("prediction service at {} returned status {}", endpoint, status),
        },
        FailureKind::TransportOther => {
            format!("prediction service request to {} failed: {}", endpoint, failure.detail)
        }
    };

    Classification {
        kind: failure.kind,
        message,
        fallback_recommended: true,
    }
}

/// Reduced classification used by the batch and health paths
pub fn failure_message(failure: &TransportFailure) -> String {
    failure.detail.clone()
}

fn non_empty(body: &Option<String>) -> Option<&str> {
    body.as_deref().map(str::trim).filter(|b| !b.is_empty())
}
