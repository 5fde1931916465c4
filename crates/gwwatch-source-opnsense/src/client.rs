//! HTTP client for the OPNsense gateway status endpoint.

use std::time::Duration;

use async_trait::async_trait;
use gwwatch_core::{GatewayStatus, SourceError, StatusSource};

use crate::response::decode_statuses;

/// Path of the gateway status API, relative to the router URL.
pub const STATUS_PATH: &str = "/api/routes/gateway/status";

/// Default request timeout (milliseconds).
pub const DEFAULT_TIMEOUT_MS: u64 = 5000;

/// Connection settings for one router.
#[derive(Debug, Clone)]
pub struct OpnsenseConfig {
    pub router_url: String,
    pub api_key: String,
    pub api_secret: String,
    pub timeout: Duration,
    /// Skip TLS certificate verification (self-signed router certificates).
    pub accept_invalid_certs: bool,
}

impl OpnsenseConfig {
    pub fn new(
        router_url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            router_url: router_url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            accept_invalid_certs: false,
        }
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }
}

/// Trim trailing slashes and default to `https://` when no scheme is given.
pub fn normalize_router_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Status source backed by one OPNsense router.
pub struct OpnsenseClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    api_secret: String,
}

impl OpnsenseClient {
    pub fn new(config: OpnsenseConfig) -> Result<Self, SourceError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| SourceError::Request(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: normalize_router_url(&config.router_url),
            api_key: config.api_key,
            api_secret: config.api_secret,
        })
    }

    pub fn status_url(&self) -> String {
        format!("{}{STATUS_PATH}", self.base_url)
    }

    /// Credential and connectivity check: one status request, returning the
    /// number of gateways the router reported.
    pub async fn verify(&self) -> Result<usize, SourceError> {
        self.fetch_statuses().await.map(|statuses| statuses.len())
    }
}

/// Map a transport error onto the source taxonomy.
///
/// reqwest reports TLS handshake and certificate failures as connect errors;
/// those become [`SourceError::Tls`] so they are never mistaken for an outage.
fn classify(e: reqwest::Error) -> SourceError {
    if e.is_timeout() {
        SourceError::Timeout
    } else if e.is_connect() {
        match tls_cause(&e) {
            Some(cause) => SourceError::Tls(cause),
            None => SourceError::Connect(e.to_string()),
        }
    } else if e.is_decode() {
        SourceError::Decode(e.to_string())
    } else if let Some(status) = e.status() {
        SourceError::Http {
            status: status.as_u16(),
        }
    } else {
        SourceError::Request(e.to_string())
    }
}

const TLS_MARKERS: [&str; 4] = ["tls", "ssl", "certificate", "handshake"];

/// First error in the `source()` chain that names a TLS problem. The top-level
/// error is skipped since its message embeds the request URL.
fn tls_cause(e: &(dyn std::error::Error + 'static)) -> Option<String> {
    let mut current = e.source();
    while let Some(err) = current {
        let message = err.to_string();
        let lower = message.to_ascii_lowercase();
        if TLS_MARKERS.iter().any(|m| lower.contains(m)) {
            return Some(message);
        }
        current = err.source();
    }
    None
}

#[async_trait]
impl StatusSource for OpnsenseClient {
    fn identity(&self) -> &str {
        &self.base_url
    }

    async fn fetch_statuses(&self) -> Result<Vec<GatewayStatus>, SourceError> {
        let response = self
            .client
            .get(self.status_url())
            .basic_auth(&self.api_key, Some(&self.api_secret))
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(classify)?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(classify)?;
        let statuses = decode_statuses(&body).map_err(|e| SourceError::Decode(e.to_string()))?;
        tracing::debug!("{} reported {} gateways", self.base_url, statuses.len());
        Ok(statuses)
    }
}
