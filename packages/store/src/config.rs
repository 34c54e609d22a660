//! Store configuration.
//!
//! Configuration only decides where requests go and how the transport
//! behaves; it never changes request semantics.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::StoreError;

/// Service endpoint used when nothing else is configured.
pub const DEFAULT_ENDPOINT: &str = "https://www.jsonstore.io";

/// Environment variable overriding the endpoint.
pub const ENDPOINT_ENV: &str = "JSONSTORE_URL";

/// Environment variable setting the transport timeout in milliseconds.
pub const TIMEOUT_ENV: &str = "JSONSTORE_TIMEOUT_MS";

const DEFAULT_WORKER_THREADS: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Base endpoint URL of the remote service.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Transport timeout. `None` means no deadline.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Worker threads for a runtime owned by the store.
    #[serde(default = "default_worker_threads")]
    pub worker_threads: usize,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_worker_threads() -> usize {
    DEFAULT_WORKER_THREADS
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_ms: None,
            worker_threads: default_worker_threads(),
        }
    }
}

impl StoreConfig {
    /// Defaults overlaid with `JSONSTORE_URL` and `JSONSTORE_TIMEOUT_MS`.
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`StoreConfig::from_env`], reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, StoreError> {
        let mut config = Self::default();

        if let Some(endpoint) = lookup(ENDPOINT_ENV).filter(|v| !v.trim().is_empty()) {
            config.endpoint = endpoint.trim().to_string();
        }

        if let Some(raw) = lookup(TIMEOUT_ENV) {
            let timeout_ms = raw.trim().parse::<u64>().map_err(|e| StoreError::Config {
                message: format!("{TIMEOUT_ENV}={raw:?}: {e}"),
            })?;
            config.timeout_ms = Some(timeout_ms);
        }

        Ok(config)
    }

    /// Parse a JSON configuration document. Missing fields take defaults.
    pub fn from_json_str(json: &str) -> Result<Self, StoreError> {
        serde_json::from_str(json).map_err(|e| StoreError::Config {
            message: e.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }

    /// The validated endpoint with any trailing `/` removed.
    pub fn endpoint_url(&self) -> Result<String, StoreError> {
        let url = Url::parse(self.endpoint.trim())?;
        if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
            return Err(StoreError::Config {
                message: format!("endpoint must be an http(s) URL, got {:?}", self.endpoint),
            });
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(StoreError::Config {
                message: "endpoint must not carry a query or fragment".to_string(),
            });
        }

        Ok(url.as_str().trim_end_matches('/').to_string())
    }
}
