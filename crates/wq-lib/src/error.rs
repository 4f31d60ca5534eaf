//! Construction-time errors
//!
//! Prediction operations never fail; failures are reported inside their
//! result values. These errors only arise while building a client.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid prediction service URL {url:?}: {source}")]
    InvalidBaseUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("prediction service URL {0:?} must use http or https")]
    UnsupportedScheme(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),
}

pub type Result<T> = std::result::Result<T, ClientError>;
