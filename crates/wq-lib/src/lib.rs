//! Water quality prediction client library
//!
//! This crate provides:
//! - Sensor reading normalization into prediction requests
//! - HTTP transport with hard per-call timeouts
//! - Failure classification and degraded-mode signaling
//! - Prometheus metrics and structured diagnostics

pub mod classify;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod observability;
pub mod policy;
pub mod transport;

pub use classify::{classify, failure_message, Classification};
pub use client::PredictionClient;
pub use config::{ClientConfig, DEFAULT_SERVICE_URL};
pub use error::ClientError;
pub use models::*;
pub use normalize::normalize;
pub use observability::{ClientMetrics, DiagnosticLogger};
pub use policy::{CallPolicy, RetryPolicy};
pub use transport::{HttpTransport, RawResponse, Transport, TransportFailure};
