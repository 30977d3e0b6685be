//! Web server module
//!
//! Provides the JSON API consumed by the search UI.

mod error;
mod handlers;
mod routes;
mod state;

pub use error::ErrorBody;
pub use handlers::{HitList, IndexesResponse, SearchEnvelope, SearchPayload};
pub use routes::create_router;
pub use state::AppState;
