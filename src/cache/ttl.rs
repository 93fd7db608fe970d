//! TTL Policy Module
//!
//! Picks a cache lifetime from the shape of a request.

use serde::Serialize;

use crate::cache::QueryParams;

/// Parameter that identifies a single item.
pub const ID_PARAM: &str = "id";
/// Parameters that ask for the item's heavy payload along with its metadata.
pub const PAYLOAD_PARAMS: &[&str] = &["include_content", "full"];
/// Parameters that set an explicit page size.
pub const PAGE_SIZE_PARAMS: &[&str] = &["limit", "page_size", "per_page"];
/// Parameters that carry a full-text query term.
pub const QUERY_PARAMS: &[&str] = &["q", "query", "search"];

// == Request Category ==
/// Request shape used to choose a TTL multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestCategory {
    /// One item fetched without its heavy payload
    Metadata,
    /// A collection fetched with an explicit page size
    Listing,
    /// A full-text search
    Search,
    Default,
}

impl RequestCategory {
    /// Classifies a request. Checks run metadata, listing, search, in that
    /// order, and the first match wins.
    pub fn of(params: &QueryParams) -> Self {
        let has_id = params.contains(ID_PARAM);
        let wants_payload = PAYLOAD_PARAMS
            .iter()
            .any(|name| params.get(name).is_some_and(|v| v.is_truthy()));

        if has_id && !wants_payload {
            RequestCategory::Metadata
        } else if PAGE_SIZE_PARAMS.iter().any(|name| params.contains(name)) {
            RequestCategory::Listing
        } else if QUERY_PARAMS
            .iter()
            .any(|name| params.get(name).is_some_and(|v| !v.to_string().is_empty()))
        {
            RequestCategory::Search
        } else {
            RequestCategory::Default
        }
    }
}

// == TTL Policy ==
/// Base TTL plus one multiplier per request category.
#[derive(Debug, Clone, PartialEq)]
pub struct TtlPolicy {
    pub base_ttl: u64,
    pub metadata: f64,
    pub listing: f64,
    pub search: f64,
    pub default: f64,
}

impl TtlPolicy {
    pub fn new(base_ttl: u64) -> Self {
        Self {
            base_ttl,
            ..Self::default()
        }
    }

    pub fn multiplier(&self, category: RequestCategory) -> f64 {
        match category {
            RequestCategory::Metadata => self.metadata,
            RequestCategory::Listing => self.listing,
            RequestCategory::Search => self.search,
            RequestCategory::Default => self.default,
        }
    }

    /// TTL in seconds for a request. The path is accepted for symmetry with
    /// the key; only the parameters decide the category.
    pub fn select_ttl(&self, _path: &str, params: &QueryParams) -> u64 {
        let multiplier = self.multiplier(RequestCategory::of(params));
        (self.base_ttl as f64 * multiplier.max(0.0)).round() as u64
    }
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            base_ttl: 300,
            metadata: 3.0,
            listing: 2.0,
            search: 1.5,
            default: 1.0,
        }
    }
}
