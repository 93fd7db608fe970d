//! Retrying request dispatcher
//!
//! Cache lookup, upstream call with timeout and backoff, error
//! classification and cache population behind a single `fetch` call.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::cache::{derive_key, CacheEntry, CacheStats, QueryParams, SharedCache, TtlPolicy};
use crate::client::{classify, HttpTransport, RawFailure, RetryPolicy, Transport};
use crate::config::Config;
use crate::error::{FetchError, Result};

/// Front door to the upstream API.
///
/// Holds no mutable state of its own; clones share the transport and the
/// cache. Concurrent fetches of the same key are not coalesced, so both may
/// reach the upstream and the later one wins the cache slot.
pub struct Dispatcher<T = HttpTransport> {
    transport: Arc<T>,
    cache: SharedCache,
    ttl_policy: TtlPolicy,
    retry: RetryPolicy,
    request_timeout: Duration,
}

impl<T> Clone for Dispatcher<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            cache: Arc::clone(&self.cache),
            ttl_policy: self.ttl_policy.clone(),
            retry: self.retry.clone(),
            request_timeout: self.request_timeout,
        }
    }
}

impl Dispatcher<HttpTransport> {
    /// Builds a dispatcher with an HTTP transport and policies from `config`.
    pub fn from_config(config: &Config, cache: SharedCache) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Ok(Self::new(transport, cache)
            .with_ttl_policy(config.ttl_policy())
            .with_retry_policy(config.retry_policy())
            .with_request_timeout(config.request_timeout()))
    }
}

impl<T: Transport> Dispatcher<T> {
    pub fn new(transport: T, cache: SharedCache) -> Self {
        Self {
            transport: Arc::new(transport),
            cache,
            ttl_policy: TtlPolicy::default(),
            retry: RetryPolicy::default(),
            request_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_ttl_policy(mut self, ttl_policy: TtlPolicy) -> Self {
        self.ttl_policy = ttl_policy;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn cache(&self) -> &SharedCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    // == Fetch ==
    /// Returns the parsed JSON body for `path`, from the cache when possible.
    pub async fn fetch(&self, path: &str, params: &QueryParams) -> Result<Value> {
        self.dispatch(path, params, true).await
    }

    /// Always goes to the upstream and leaves the cache untouched.
    pub async fn refresh(&self, path: &str, params: &QueryParams) -> Result<Value> {
        self.dispatch(path, params, false).await
    }

    /// Like [`Dispatcher::fetch`], decoding the body into `D`.
    pub async fn fetch_as<D: DeserializeOwned>(&self, path: &str, params: &QueryParams) -> Result<D> {
        let value = self.fetch(path, params).await?;
        serde_json::from_value(value).map_err(|e| {
            FetchError::internal(format!("unexpected response shape: {}", e))
                .with_context("resource", path)
        })
    }

    /// The full fetch algorithm. With `use_cache` false the cache is neither
    /// read nor written.
    pub async fn dispatch(&self, path: &str, params: &QueryParams, use_cache: bool) -> Result<Value> {
        validate_request(path, params)?;
        let key = derive_key(path, params);

        if use_cache {
            let cached = self.cache.write().await.get(&key);
            if let Some(value) = cached {
                debug!(key = %key, "cache hit");
                return Ok(value);
            }
            debug!(key = %key, "cache miss");
        }

        let value = match self.send_with_retry(path, params).await {
            Ok(value) => value,
            Err(failure) => {
                let error = with_resource_context(classify::to_fetch_error(&failure), path, params);
                info!(
                    key = %key,
                    kind = %error.kind,
                    status = ?error.status,
                    "upstream request failed"
                );
                return Err(error);
            }
        };

        if use_cache {
            let ttl = self.ttl_policy.select_ttl(path, params);
            let tags = resource_tag(path).into_iter().collect();
            let stored = self
                .cache
                .write()
                .await
                .set_tagged(key.clone(), value.clone(), ttl, tags);
            match stored {
                Ok(()) => debug!(key = %key, ttl, "cached response"),
                Err(err) => warn!(key = %key, error = %err, "response not cached"),
            }
        }

        Ok(value)
    }

    // Runs up to `max_retries + 1` attempts and returns the parsed body or
    // the last failure seen.
    async fn send_with_retry(&self, path: &str, params: &QueryParams) -> std::result::Result<Value, RawFailure> {
        let query = params.sorted_pairs();
        let mut retries_done: u32 = 0;

        loop {
            let failure = match self.transport.send(path, &query, self.request_timeout).await {
                Ok(response) if response.is_success() => return parse_body(response.status, &response.body),
                Ok(response) => RawFailure::Response(response),
                Err(failure) => failure,
            };

            if !self.retry.should_retry(&failure, retries_done) {
                return Err(failure);
            }

            retries_done += 1;
            let delay = self.retry.delay(retries_done);
            warn!(
                path,
                attempt = retries_done,
                max_retries = self.retry.max_retries,
                status = ?failure.status(),
                delay_ms = delay.as_millis() as u64,
                "retrying upstream request"
            );
            tokio::time::sleep(delay).await;
        }
    }

    // == Cache Administration ==
    pub async fn stats(&self) -> CacheStats {
        self.cache.read().await.stats()
    }

    /// Drops every cached response.
    pub async fn clear(&self) -> usize {
        self.cache.write().await.clear()
    }

    /// Drops cached responses for one resource type, e.g. `items`.
    pub async fn invalidate_tag(&self, tag: &str) -> usize {
        self.cache.write().await.invalidate_tag(tag)
    }

    /// Drops cached responses matching `predicate`.
    pub async fn clear_where<F>(&self, predicate: F) -> usize
    where
        F: FnMut(&CacheEntry) -> bool,
    {
        self.cache.write().await.delete_where(predicate)
    }
}

fn parse_body(status: u16, body: &str) -> std::result::Result<Value, RawFailure> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body).map_err(|e| RawFailure::Decode {
        status,
        message: format!("invalid JSON in response body: {}", e),
    })
}

/// Rejects requests that cannot be turned into an upstream URL.
fn validate_request(path: &str, params: &QueryParams) -> Result<()> {
    let reason = if path.is_empty() {
        Some("path must not be empty")
    } else if !path.starts_with('/') {
        Some("path must start with '/'")
    } else if path.contains("://") {
        Some("path must be relative to the upstream base URL")
    } else if path.contains('?') || path.contains('#') {
        Some("path must not carry a query string or fragment")
    } else {
        None
    };

    if let Some(reason) = reason {
        return Err(FetchError::invalid_request(reason).with_context("path", path));
    }

    if params.names().any(|name| name.trim().is_empty()) {
        return Err(FetchError::invalid_request("parameter names must not be empty")
            .with_context("path", path));
    }

    Ok(())
}

/// First path segment, used to tag cached responses: `/items/42` is `items`.
pub fn resource_tag(path: &str) -> Option<String> {
    path.split('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

fn with_resource_context(error: FetchError, path: &str, params: &QueryParams) -> FetchError {
    let error = error.with_context("resource", path);
    match params.get(crate::cache::ID_PARAM) {
        Some(id) => error.with_context("id", id.to_string()),
        None => error,
    }
}
