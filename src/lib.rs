//! DocSearch-RS: a vector search gateway with optional reranking
//!
//! Validates free-text search requests against a discovered catalog of
//! indexes and namespaces, queries a vector backend, optionally reorders
//! the hits with a rerank model, and reports merged usage accounting.

pub mod backends;
pub mod catalog;
pub mod config;
pub mod error;
pub mod metrics;
pub mod network;
pub mod search;
pub mod web;

pub use catalog::{Catalog, CatalogHandle};
pub use config::Settings;
pub use error::SearchError;
pub use search::{Hit, Search, SearchRequest, SearchResponse, Usage};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Hit count used when a request does not specify one
pub const DEFAULT_TOP_K: u32 = 10;

/// Smallest hit count a search may request
pub const MIN_TOP_K: u32 = 1;

/// Largest hit count a search may request
pub const MAX_TOP_K: u32 = 50;
