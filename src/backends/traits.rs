//! Backend traits and types

use super::rerank_model::RerankModel;
use crate::error::Result;
use crate::search::{Hit, Usage};
use async_trait::async_trait;

/// A single similarity query, already validated by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorQuery {
    /// Query text embedded by the backend
    pub text: String,
    /// Index to query
    pub index_name: String,
    /// Namespace within the index
    pub namespace: String,
    /// Number of hits to request
    pub top_k: u32,
}

/// Ranked hits and usage from one similarity query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutcome {
    /// Hits in backend rank order
    pub hits: Vec<Hit>,
    pub usage: Usage,
}

/// One document offered to the reranker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RerankCandidate {
    pub id: String,
    pub text: String,
}

impl RerankCandidate {
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// A ranked candidate with its new relevance score.
///
/// `index` is the candidate's position in the slice passed to the reranker;
/// ids need not be unique, so positions are what identify a candidate.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedId {
    pub index: usize,
    pub id: String,
    pub score: f64,
}

impl RankedId {
    pub fn new(index: usize, id: impl Into<String>, score: f64) -> Self {
        Self {
            index,
            id: id.into(),
            score,
        }
    }
}

/// Reranker output: a reordered, possibly smaller, set of candidate ids
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RerankOutcome {
    /// Most relevant first
    pub ranked: Vec<RankedId>,
    pub usage: Usage,
}

/// Vector similarity backend.
///
/// Fails with `BackendUnavailable` on transport errors and timeouts, and
/// `BackendRejected` when the backend refuses the request. Results are
/// never cached.
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Backend name for logs
    fn name(&self) -> &str;

    /// Run one similarity query
    async fn query(&self, query: &VectorQuery) -> Result<QueryOutcome>;
}

/// Second-pass relevance model.
///
/// Taking a [`RerankModel`] means an unrecognized identifier is rejected
/// when it is parsed, before any call is made. Failures are reported as
/// `RerankUnavailable`.
#[async_trait]
pub trait Reranker: Send + Sync {
    async fn rerank(
        &self,
        query: &str,
        model: RerankModel,
        candidates: &[RerankCandidate],
    ) -> Result<RerankOutcome>;
}

/// Source of the index/namespace catalog
#[async_trait]
pub trait IndexDirectory: Send + Sync {
    /// Names of all indexes
    async fn list_indexes(&self) -> Result<Vec<String>>;

    /// Names of all namespaces of one index
    async fn list_namespaces(&self, index_name: &str) -> Result<Vec<String>>;
}
