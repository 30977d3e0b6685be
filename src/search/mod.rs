//! Search orchestration module
//!
//! Validates requests, runs the vector query and optional rerank pass,
//! and composes the final response.

mod executor;
mod models;

pub use executor::Search;
pub use models::*;
