//! Search backend module
//!
//! Defines the vector store, reranker and index directory traits and the
//! Pinecone implementation of all three.

mod rerank_model;
mod static_directory;
mod traits;

pub mod pinecone;

pub use pinecone::Pinecone;
pub use rerank_model::RerankModel;
pub use static_directory::StaticDirectory;
pub use traits::*;
