//! Client Module
//!
//! Fetches JSON from the upstream API through the cache, retrying transient
//! failures and classifying terminal ones.

pub mod classify;
mod dispatcher;
mod retry;
mod transport;

pub use classify::{classify, to_fetch_error, RawFailure};
pub use dispatcher::{resource_tag, Dispatcher};
pub use retry::RetryPolicy;
pub use transport::{HttpTransport, Transport, UpstreamResponse};
