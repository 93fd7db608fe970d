//! Request DTOs for the admin API
//!
//! Defines the structure of incoming query strings.

use std::collections::HashSet;

use serde::Deserialize;

use crate::cache::QueryParams;
use crate::error::{FetchError, Result};

/// Query string of `GET /fetch/*path`, forwarded to the upstream as is.
///
/// Pairs are kept in arrival order so repeated names can be detected.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct FetchQuery(pub Vec<(String, String)>);

impl FetchQuery {
    /// Converts to upstream parameters. A name given more than once
    /// (`?tag=a&tag=b`) is rejected.
    pub fn into_params(self) -> Result<QueryParams> {
        let mut seen = HashSet::new();
        for (name, _) in &self.0 {
            if !seen.insert(name.as_str()) {
                return Err(FetchError::invalid_request("query parameter given more than once")
                    .with_context("param", name.as_str()));
            }
        }
        Ok(self.0.into_iter().collect())
    }
}

/// Query string of `DELETE /cache/keys`.
#[derive(Debug, Clone, Deserialize)]
pub struct ClearKeysRequest {
    /// Substring a key must contain to be dropped
    #[serde(default)]
    pub contains: String,
}

impl ClearKeysRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.contains.is_empty() {
            return Some("'contains' must not be empty; use DELETE /cache to drop everything".to_string());
        }
        None
    }
}
