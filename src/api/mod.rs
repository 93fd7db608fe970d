//! API Module
//!
//! HTTP handlers and routing for the admin and pass-through API.
//!
//! # Endpoints
//! - `GET /fetch/*path` - Fetch an upstream resource through the cache
//! - `GET /refresh/*path` - Fetch an upstream resource bypassing the cache
//! - `GET /stats` - Get cache statistics
//! - `GET /cache/entries` - List live cache entries
//! - `DELETE /cache` - Drop every cached response
//! - `DELETE /cache/tags/:tag` - Drop cached responses for one resource type
//! - `DELETE /cache/keys?contains=...` - Drop cached responses by key substring
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
