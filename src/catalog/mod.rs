//! Catalog of available indexes and namespaces
//!
//! Discovery runs once per session (or on explicit refresh); every search
//! validates against the current immutable snapshot.

mod handle;
mod service;
mod snapshot;

pub use handle::{CatalogHandle, CatalogState, CatalogStatus};
pub use service::CatalogService;
pub use snapshot::Catalog;
