//! HTTP networking module
//!
//! Provides the outgoing HTTP client used by the backend implementations.

mod client;
mod retry;

pub use client::{HttpClient, HttpError, HttpMethod};
pub use retry::RetryPolicy;
