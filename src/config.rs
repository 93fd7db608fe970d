//! Configuration Module
//!
//! Handles loading and managing configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::cache::TtlPolicy;
use crate::client::RetryPolicy;

/// Runtime configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Base URL of the upstream API
    pub upstream_base_url: String,
    /// Credential sent with every upstream request
    pub upstream_api_key: Option<String>,
    /// Header carrying the credential
    pub upstream_api_key_header: String,
    /// Base TTL in seconds before category multipliers
    pub base_ttl: u64,
    pub ttl_multiplier_metadata: f64,
    pub ttl_multiplier_listing: f64,
    pub ttl_multiplier_search: f64,
    pub ttl_multiplier_default: f64,
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry in milliseconds
    pub retry_base_delay_ms: u64,
    /// Per-attempt timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Maximum number of distinct cache keys
    pub max_keys: usize,
    /// Background cleanup task interval in seconds
    pub cleanup_interval: u64,
    /// Admin HTTP server port
    pub server_port: u16,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `UPSTREAM_BASE_URL` - Upstream API base URL (default: http://localhost:8080)
    /// - `UPSTREAM_API_KEY` - Credential for the upstream API (default: unset)
    /// - `UPSTREAM_API_KEY_HEADER` - Header for the credential (default: x-api-key)
    /// - `BASE_TTL` - Base TTL in seconds (default: 300)
    /// - `TTL_MULTIPLIER_METADATA` / `_LISTING` / `_SEARCH` / `_DEFAULT` (default: 3 / 2 / 1.5 / 1)
    /// - `MAX_RETRIES` - Retries after the first attempt (default: 3)
    /// - `RETRY_BASE_DELAY_MS` - First backoff delay (default: 1000)
    /// - `REQUEST_TIMEOUT_MS` - Per-attempt timeout (default: 10000)
    /// - `MAX_KEYS` - Maximum cache keys (default: 1000)
    /// - `CLEANUP_INTERVAL` - Cleanup frequency in seconds (default: 60)
    /// - `SERVER_PORT` - Admin HTTP server port (default: 3000)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds a Config from any name-to-value lookup. Missing or unparseable
    /// values fall back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            upstream_base_url: lookup("UPSTREAM_BASE_URL")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_base_url),
            upstream_api_key: lookup("UPSTREAM_API_KEY").filter(|v| !v.is_empty()),
            upstream_api_key_header: lookup("UPSTREAM_API_KEY_HEADER")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.upstream_api_key_header),
            base_ttl: parse_or(lookup("BASE_TTL"), defaults.base_ttl),
            ttl_multiplier_metadata: parse_multiplier(lookup("TTL_MULTIPLIER_METADATA"), defaults.ttl_multiplier_metadata),
            ttl_multiplier_listing: parse_multiplier(lookup("TTL_MULTIPLIER_LISTING"), defaults.ttl_multiplier_listing),
            ttl_multiplier_search: parse_multiplier(lookup("TTL_MULTIPLIER_SEARCH"), defaults.ttl_multiplier_search),
            ttl_multiplier_default: parse_multiplier(lookup("TTL_MULTIPLIER_DEFAULT"), defaults.ttl_multiplier_default),
            max_retries: parse_or(lookup("MAX_RETRIES"), defaults.max_retries),
            retry_base_delay_ms: parse_or(lookup("RETRY_BASE_DELAY_MS"), defaults.retry_base_delay_ms),
            request_timeout_ms: parse_or(lookup("REQUEST_TIMEOUT_MS"), defaults.request_timeout_ms),
            max_keys: parse_or(lookup("MAX_KEYS"), defaults.max_keys),
            cleanup_interval: parse_or(lookup("CLEANUP_INTERVAL"), defaults.cleanup_interval),
            server_port: parse_or(lookup("SERVER_PORT"), defaults.server_port),
        }
    }

    pub fn ttl_policy(&self) -> TtlPolicy {
        TtlPolicy {
            base_ttl: self.base_ttl,
            metadata: self.ttl_multiplier_metadata,
            listing: self.ttl_multiplier_listing,
            search: self.ttl_multiplier_search,
            default: self.ttl_multiplier_default,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_base_delay_ms))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Sweep interval, never shorter than one second.
    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval.max(1))
    }
}

fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|v| v.trim().parse().ok()).unwrap_or(default)
}

/// Like [`parse_or`], also falling back for `inf`, `NaN` and negatives.
fn parse_multiplier(value: Option<String>, default: f64) -> f64 {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|m| m.is_finite() && *m >= 0.0)
        .unwrap_or(default)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            upstream_base_url: "http://localhost:8080".to_string(),
            upstream_api_key: None,
            upstream_api_key_header: "x-api-key".to_string(),
            base_ttl: 300,
            ttl_multiplier_metadata: 3.0,
            ttl_multiplier_listing: 2.0,
            ttl_multiplier_search: 1.5,
            ttl_multiplier_default: 1.0,
            max_retries: 3,
            retry_base_delay_ms: 1000,
            request_timeout_ms: 10_000,
            max_keys: 1000,
            cleanup_interval: 60,
            server_port: 3000,
        }
    }
}
