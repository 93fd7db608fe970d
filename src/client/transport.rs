//! Upstream transport
//!
//! The request-issuing capability used by the dispatcher, and its reqwest
//! implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, ACCEPT};

use crate::client::RawFailure;
use crate::config::Config;
use crate::error::FetchError;

// == Upstream Response ==
/// Status and raw body of an upstream reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpstreamResponse {
    pub status: u16,
    pub body: String,
}

impl UpstreamResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// == Transport Trait ==
/// Issues one GET request to the upstream API.
///
/// Implementations return `Ok` for every response that arrived, whatever
/// its status, and `Err` only when no usable response was received.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<UpstreamResponse, RawFailure>;
}

// == HTTP Transport ==
/// reqwest-backed transport bound to one base URL and credential.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    credential: Option<(HeaderName, HeaderValue)>,
}

impl HttpTransport {
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("remote_cache/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::internal(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential: None,
        })
    }

    /// Attaches `value` as header `name` on every request.
    pub fn with_credential(mut self, name: &str, value: &str) -> Result<Self, FetchError> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            FetchError::invalid_request(format!("invalid credential header name: {}", e))
                .with_context("header", name)
        })?;
        let mut value = HeaderValue::from_str(value).map_err(|e| {
            FetchError::invalid_request(format!("invalid credential header value: {}", e))
        })?;
        value.set_sensitive(true);

        self.credential = Some((name, value));
        Ok(self)
    }

    /// Builds a transport from the upstream section of the configuration.
    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let transport = Self::new(config.upstream_base_url.clone())?;
        match &config.upstream_api_key {
            Some(key) => transport.with_credential(&config.upstream_api_key_header, key),
            None => Ok(transport),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        path: &str,
        query: &[(String, String)],
        timeout: Duration,
    ) -> Result<UpstreamResponse, RawFailure> {
        let url = format!("{}{}", self.base_url, path);

        let mut request = self
            .client
            .get(&url)
            .query(query)
            .header(ACCEPT, "application/json")
            .timeout(timeout);
        if let Some((name, value)) = &self.credential {
            request = request.header(name.clone(), value.clone());
        }

        let response = request.send().await.map_err(RawFailure::from_reqwest)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| RawFailure::Network {
            timed_out: e.is_timeout(),
            message: format!("failed to read response body: {}", e),
        })?;

        Ok(UpstreamResponse { status, body })
    }
}
