//! Per-operation call policies
//!
//! Timeouts are fixed per operation and a call is made exactly once.
//! Callers wanting retries wrap the client; the client itself never loops.

use std::time::Duration;

/// Retry behaviour applied by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[non_exhaustive]
pub enum RetryPolicy {
    /// One attempt per invocation
    #[default]
    Never,
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        match self {
            RetryPolicy::Never => 1,
        }
    }
}

/// Timeout and retry settings for one client operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallPolicy {
    pub operation: &'static str,
    pub timeout: Duration,
    pub retry: RetryPolicy,
}

impl CallPolicy {
    /// Single reading prediction
    pub const PREDICT: CallPolicy = CallPolicy {
        operation: "predict",
        timeout: Duration::from_millis(10_000),
        retry: RetryPolicy::Never,
    };

    /// Batch prediction
    pub const BATCH: CallPolicy = CallPolicy {
        operation: "predict_batch",
        timeout: Duration::from_millis(30_000),
        retry: RetryPolicy::Never,
    };

    /// Liveness probe
    pub const HEALTH: CallPolicy = CallPolicy {
        operation: "health_check",
        timeout: Duration::from_millis(5_000),
        retry: RetryPolicy::Never,
    };

    pub fn timeout_ms(&self) -> u64 {
        self.timeout.as_millis() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_timeouts() {
        assert_eq!(CallPolicy::PREDICT.timeout_ms(), 10_000);
        assert_eq!(CallPolicy::BATCH.timeout_ms(), 30_000);
        assert_eq!(CallPolicy::HEALTH.timeout_ms(), 5_000);
    }

    #[test]
    fn test_single_attempt() {
        for policy in [CallPolicy::PREDICT, CallPolicy::BATCH, CallPolicy::HEALTH] {
            assert_eq!(policy.retry, RetryPolicy::Never);
            assert_eq!(policy.retry.max_attempts(), 1);
        }
    }
}
