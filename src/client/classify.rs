//! Error Classifier
//!
//! Maps raw upstream failures onto [`ErrorKind`].

use serde_json::Value;

use crate::client::UpstreamResponse;
use crate::error::{ErrorKind, FetchError};

const GENERIC_MESSAGE: &str = "upstream request failed";
const MAX_BODY_MESSAGE_LEN: usize = 200;

// == Raw Failure ==
/// A failure as observed by the dispatcher, before classification.
#[derive(Debug, Clone, PartialEq)]
pub enum RawFailure {
    /// A status reported directly, without a response body
    Status { status: u16, message: String },
    /// A complete non-2xx response
    Response(UpstreamResponse),
    /// No response was received
    Network { timed_out: bool, message: String },
    /// A 2xx response whose body could not be parsed
    Decode { status: u16, message: String },
}

impl RawFailure {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => RawFailure::Status {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None => RawFailure::Network {
                timed_out: err.is_timeout(),
                message: err.to_string(),
            },
        }
    }

    /// HTTP status, wherever it is carried.
    pub fn status(&self) -> Option<u16> {
        match self {
            RawFailure::Status { status, .. } | RawFailure::Decode { status, .. } => Some(*status),
            RawFailure::Response(response) => Some(response.status),
            RawFailure::Network { .. } => None,
        }
    }

    /// Human-readable message, wherever it is carried.
    pub fn message(&self) -> String {
        match self {
            RawFailure::Status { status, message } => non_empty(message).unwrap_or_else(|| status_text(*status)),
            RawFailure::Response(response) => {
                body_message(&response.body).unwrap_or_else(|| status_text(response.status))
            }
            RawFailure::Network { message, .. } | RawFailure::Decode { message, .. } => {
                non_empty(message).unwrap_or_else(|| GENERIC_MESSAGE.to_string())
            }
        }
    }

    pub fn timed_out(&self) -> bool {
        matches!(self, RawFailure::Network { timed_out: true, .. })
    }
}

// == Classify ==
/// Picks the error kind for a raw failure. Never fails.
pub fn classify(raw: &RawFailure) -> ErrorKind {
    match raw.status() {
        Some(404) => ErrorKind::NotFound,
        Some(401) | Some(403) => ErrorKind::Unauthorized,
        Some(status) if status >= 500 => ErrorKind::ServiceUnavailable,
        Some(_) => ErrorKind::Internal,
        None if raw.timed_out() => ErrorKind::Timeout,
        None => ErrorKind::Internal,
    }
}

/// Converts a raw failure into the error handed to callers.
pub fn to_fetch_error(raw: &RawFailure) -> FetchError {
    let error = FetchError::of_kind(classify(raw), raw.message());
    match raw.status() {
        Some(status) => error.with_status(status),
        None => error,
    }
}

// Pulls a message out of common JSON error shapes, falling back to a short
// plain-text body.
fn body_message(body: &str) -> Option<String> {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        let candidates = [
            json.pointer("/error/message"),
            json.get("message"),
            json.get("error"),
            json.get("detail"),
        ];
        return candidates
            .into_iter()
            .flatten()
            .find_map(|v| v.as_str())
            .and_then(non_empty);
    }

    let text = body.trim();
    if text.is_empty() || text.len() > MAX_BODY_MESSAGE_LEN {
        None
    } else {
        Some(text.to_string())
    }
}

fn status_text(status: u16) -> String {
    let reason = reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason());
    match reason {
        Some(reason) => format!("HTTP {} {}", status, reason),
        None => format!("HTTP {}", status),
    }
}

fn non_empty(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}
