//! Error types for the cache and the upstream dispatcher
//!
//! Provides unified error handling using thiserror.

use std::collections::BTreeMap;
use std::fmt;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

// == Cache Error Enum ==
/// Errors raised by the cache store itself.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// The store already holds its maximum number of distinct keys
    #[error("Cache full: refusing new key, limit is {max_keys} keys")]
    CapacityExceeded { max_keys: usize },
}

// == Error Kind ==
/// Closed set of failure categories a caller can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Upstream answered 404
    NotFound,
    /// Upstream answered 401 or 403
    Unauthorized,
    /// Upstream answered with a 5xx status
    ServiceUnavailable,
    /// The request timed out before any status was received
    Timeout,
    /// Uncategorized or local failure
    Internal,
    /// Caller-supplied arguments were rejected before dispatch
    InvalidRequest,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::Unauthorized => "unauthorized",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Internal => "internal",
            ErrorKind::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// == Fetch Error ==
/// Terminal failure surfaced by the dispatcher.
///
/// Built through one constructor per kind, then enriched with
/// [`FetchError::with_status`] and [`FetchError::with_context`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct FetchError {
    pub kind: ErrorKind,
    pub message: String,
    /// HTTP status of the upstream response, when there was one
    pub status: Option<u16>,
    /// Structured details such as the requested resource
    pub context: BTreeMap<String, String>,
}

impl FetchError {
    fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            context: BTreeMap::new(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unauthorized, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ServiceUnavailable, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    /// Builds the error matching `kind`.
    pub fn of_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        match kind {
            ErrorKind::NotFound => Self::not_found(message),
            ErrorKind::Unauthorized => Self::unauthorized(message),
            ErrorKind::ServiceUnavailable => Self::service_unavailable(message),
            ErrorKind::Timeout => Self::timeout(message),
            ErrorKind::Internal => Self::internal(message),
            ErrorKind::InvalidRequest => Self::invalid_request(message),
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for FetchError {
    fn into_response(self) -> Response {
        let status = match self.kind {
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::ServiceUnavailable => StatusCode::BAD_GATEWAY,
            ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::InvalidRequest => StatusCode::BAD_REQUEST,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.message,
            "kind": self.kind,
            "status": self.status,
            "context": self.context,
        }));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for dispatcher calls.
pub type Result<T> = std::result::Result<T, FetchError>;
