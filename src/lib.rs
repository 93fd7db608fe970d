//! Remote Cache - a caching, retrying fetch layer for a remote JSON API
//!
//! Serves repeated upstream reads from an in-memory TTL cache, retries
//! transient upstream failures with exponential backoff and reports terminal
//! failures as a small set of typed errors.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{derive_key, CacheStore, QueryParams, SharedCache, TtlPolicy};
pub use client::{Dispatcher, HttpTransport, RetryPolicy, Transport};
pub use config::Config;
pub use error::{ErrorKind, FetchError};
pub use tasks::spawn_cleanup_task;
