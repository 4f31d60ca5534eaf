//! Prediction client configuration

use crate::error::{ClientError, Result};
use serde::Deserialize;
use url::Url;

/// Service address used when `ML_SERVICE_URL` is not set
pub const DEFAULT_SERVICE_URL: &str = "http://localhost:5002";

/// Environment prefix; `ML_SERVICE_URL` maps to the `url` key
const ENV_PREFIX: &str = "ML_SERVICE";

/// Client configuration, resolved once at startup
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    /// Base URL of the prediction service
    #[serde(rename = "url", default = "default_service_url")]
    pub service_url: String,
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            service_url: default_service_url(),
        }
    }
}

impl ClientConfig {
    pub fn new(service_url: impl Into<String>) -> Self {
        Self {
            service_url: service_url.into(),
        }
    }

    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_from(config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load configuration from an explicit environment source
    pub fn load_from(env: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .set_default("url", DEFAULT_SERVICE_URL)?
            .add_source(env)
            .build()?;

        let loaded: ClientConfig = config.try_deserialize()?;
        loaded.base_url()?;
        Ok(loaded)
    }

    /// Parse and check the service URL
    ///
    /// The returned URL always ends in `/` so relative joins keep any
    /// path prefix the service is mounted under.
    pub fn base_url(&self) -> Result<Url> {
        let trimmed = self.service_url.trim();
        let with_slash = if trimmed.ends_with('/') {
            trimmed.to_string()
        } else {
            format!("{}/", trimmed)
        };

        let url = Url::parse(&with_slash).map_err(|source| ClientError::InvalidBaseUrl {
            url: self.service_url.clone(),
            source,
        })?;

        match url.scheme() {
            "http" | "https" => Ok(url),
            _ => Err(ClientError::UnsupportedScheme(self.service_url.clone())),
        }
    }
}
