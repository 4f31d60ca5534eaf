//! HTTP transport to the prediction service
//!
//! The transport makes exactly one attempt per call and owns the hard
//! timeout: connect, send and body read all happen inside a single
//! deadline, after which the call is dropped and reported as timed out.

use crate::config::ClientConfig;
use crate::error::Result;
use crate::models::FailureKind;
use async_trait::async_trait;
use reqwest::{Client, Method};
use serde_json::Value;
use std::error::Error as StdError;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Successful (2xx) response with a decoded JSON body
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    pub status: u16,
    pub body: Value,
}

/// Why a transport call did not produce a 2xx response
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{detail}")]
pub struct TransportFailure {
    pub kind: FailureKind,
    pub detail: String,
    /// Response body, when the service answered with an error status
    pub body: Option<String>,
}

impl TransportFailure {
    pub fn connection_refused(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::ConnectionRefused,
            detail: detail.into(),
            body: None,
        }
    }

    pub fn timed_out(timeout: Duration) -> Self {
        Self {
            kind: FailureKind::TimedOut,
            detail: format!("timeout of {}ms exceeded", timeout.as_millis()),
            body: None,
        }
    }

    pub fn http_error(status: u16, body: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::HttpError { status },
            detail: format!("request failed with status code {}", status),
            body: Some(body.into()),
        }
    }

    pub fn other(detail: impl Into<String>) -> Self {
        Self {
            kind: FailureKind::TransportOther,
            detail: detail.into(),
            body: None,
        }
    }
}

/// Outbound call seam between the client and the network
#[async_trait]
pub trait Transport: Send + Sync {
    /// Perform one request, giving up after `timeout`
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportFailure>;

    /// Full URL for `path`, used in diagnostics
    fn endpoint(&self, path: &str) -> String;
}

/// reqwest-backed transport
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
}

impl HttpTransport {
    /// Create a transport for the configured service URL
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let base_url = config.base_url()?;
        let client = Client::builder().build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> std::result::Result<Url, TransportFailure> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportFailure::other(format!("invalid request path {:?}: {}", path, e)))
    }

    async fn exchange(
        &self,
        method: Method,
        url: Url,
        body: Option<&Value>,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportFailure> {
        let mut request = self.client.request(method, url).timeout(timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| from_reqwest(e, timeout))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| from_reqwest(e, timeout))?;

        if !status.is_success() {
            return Err(TransportFailure::http_error(status.as_u16(), text));
        }

        let body = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text).map_err(|e| {
                TransportFailure::other(format!("invalid JSON in response body: {}", e))
            })?
        };

        Ok(RawResponse {
            status: status.as_u16(),
            body,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
        timeout: Duration,
    ) -> std::result::Result<RawResponse, TransportFailure> {
        let url = self.url(path)?;
        debug!(method = %method, url = %url, timeout_ms = timeout.as_millis() as u64, "Sending request");

        // reqwest's own timeout is not relied on alone; the outer deadline
        // also covers the body read.
        match tokio::time::timeout(timeout, self.exchange(method, url, body, timeout)).await {
            Ok(result) => result,
            Err(_) => Err(TransportFailure::timed_out(timeout)),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        match self.url(path) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.base_url, path),
        }
    }
}

fn from_reqwest(err: reqwest::Error, timeout: Duration) -> TransportFailure {
    if err.is_timeout() {
        TransportFailure::timed_out(timeout)
    } else if is_connection_refused(&err) {
        TransportFailure::connection_refused(err.to_string())
    } else {
        TransportFailure::other(err.to_string())
    }
}

fn is_connection_refused(err: &reqwest::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if io.kind() == std::io::ErrorKind::ConnectionRefused {
                return true;
            }
        }
        if e.to_string().to_lowercase().contains("connection refused") {
            return true;
        }
        source = e.source();
    }
    false
}
