//! Search execution and orchestration

use super::models::{Hit, SearchRequest, SearchResponse};
use crate::backends::{
    QueryOutcome, RankedId, RerankCandidate, RerankModel, Reranker, VectorQuery, VectorStore,
};
use crate::catalog::CatalogHandle;
use crate::error::{Result, SearchError};
use crate::metrics::Metrics;
use crate::search::Usage;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Search executor: validates a request, queries the vector store, optionally
/// reranks, and merges usage from both calls.
///
/// Holds no per-request state, so one instance serves concurrent searches.
pub struct Search {
    vectors: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
    catalog: Arc<CatalogHandle>,
    metrics: Arc<Metrics>,
}

impl Search {
    /// Create a new search executor
    pub fn new(
        vectors: Arc<dyn VectorStore>,
        reranker: Arc<dyn Reranker>,
        catalog: Arc<CatalogHandle>,
    ) -> Self {
        Self {
            vectors,
            reranker,
            catalog,
            metrics: Arc::new(Metrics::new()),
        }
    }

    pub fn catalog(&self) -> &Arc<CatalogHandle> {
        &self.catalog
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Execute one search request
    pub async fn execute(&self, request: &SearchRequest) -> Result<SearchResponse> {
        let span = info_span!(
            "search",
            request_id = %Uuid::new_v4(),
            index = %request.index_name,
            namespace = %request.namespace,
        );

        async {
            let start = Instant::now();
            self.metrics.record_search(request.rerank_model().is_some());

            let result = self.run(request).await;
            let elapsed = start.elapsed();

            match &result {
                Ok(response) => {
                    self.metrics
                        .record_success(elapsed.as_millis() as u64, &response.usage);
                    info!("Search returned {} hits in {:?}", response.hits.len(), elapsed);
                }
                Err(e) => {
                    self.metrics.record_failure(e.kind());
                    match e.detail() {
                        Some(detail) => warn!("Search failed: {} ({})", e, detail),
                        None => warn!("Search failed: {}", e),
                    }
                }
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(&self, request: &SearchRequest) -> Result<SearchResponse> {
        // Shape checks first: a malformed request costs no backend call
        let top_k = validate_top_k(request.top_k)?;
        if request.query.trim().is_empty() {
            return Err(SearchError::invalid("query is required"));
        }
        let model = request
            .rerank_model()
            .map(str::parse::<RerankModel>)
            .transpose()?;

        let catalog = self.catalog.ensure_loaded().await?;
        catalog.check(&request.index_name, &request.namespace)?;

        let query = VectorQuery {
            text: request.query.clone(),
            index_name: request.index_name.clone(),
            namespace: request.namespace.clone(),
            top_k,
        };

        debug!("Querying {} with top_k={}", self.vectors.name(), top_k);
        let QueryOutcome { hits, mut usage } =
            self.vectors.query(&query).await.inspect_err(|e| {
                // The index or namespace disappeared since discovery
                if matches!(e, SearchError::BackendRejected { status: 404, .. }) {
                    self.catalog.mark_stale();
                }
            })?;
        debug!("Vector store returned {} hits", hits.len());

        let hits = match model {
            None => hits,
            Some(model) => {
                let (hits, rerank_usage) = self.rerank(&request.query, model, hits).await?;
                usage.merge(&rerank_usage);
                hits
            }
        };

        Ok(SearchResponse { hits, usage })
    }

    async fn rerank(&self, query: &str, model: RerankModel, hits: Vec<Hit>) -> Result<(Vec<Hit>, Usage)> {
        let (eligible, fallback): (Vec<Hit>, Vec<Hit>) =
            hits.into_iter().partition(|hit| hit.rerank_text().is_some());

        if eligible.is_empty() {
            debug!("No hits with rerankable text, skipping rerank");
            return Ok((fallback, Usage::new()));
        }

        let candidates: Vec<RerankCandidate> = eligible
            .iter()
            .filter_map(|hit| {
                hit.rerank_text()
                    .map(|text| RerankCandidate::new(hit.id.clone(), text))
            })
            .collect();

        info!(
            "Reranking {} hits with {} ({} without text kept at the end)",
            candidates.len(),
            model,
            fallback.len()
        );

        let outcome = self
            .reranker
            .rerank(query, model, &candidates)
            .await
            .map_err(|e| match e {
                SearchError::RerankUnavailable(_) | SearchError::UnknownModel(_) => e,
                other => SearchError::RerankUnavailable(
                    other.detail().map(str::to_string).unwrap_or_else(|| other.to_string()),
                ),
            })?;

        Ok((apply_ranking(eligible, &outcome.ranked, fallback), outcome.usage))
    }
}

/// Bounds check for the requested hit count; never clamps
fn validate_top_k(top_k: i64) -> Result<u32> {
    if (crate::MIN_TOP_K as i64..=crate::MAX_TOP_K as i64).contains(&top_k) {
        Ok(top_k as u32)
    } else {
        Err(SearchError::invalid(format!(
            "top_k must be between {} and {}, got {}",
            crate::MIN_TOP_K,
            crate::MAX_TOP_K,
            top_k
        )))
    }
}

/// Order `eligible` hits by the reranker's ranking and append `fallback`.
///
/// `ranked` refers to `eligible` by position. Reranked hits take the
/// reranker's score. Eligible hits the reranker left out are dropped;
/// fallback hits keep their original order and score.
fn apply_ranking(eligible: Vec<Hit>, ranked: &[RankedId], fallback: Vec<Hit>) -> Vec<Hit> {
    let mut slots: Vec<Option<Hit>> = eligible.into_iter().map(Some).collect();

    let mut ordered = Vec::with_capacity(ranked.len() + fallback.len());
    for entry in ranked {
        match slots.get_mut(entry.index).and_then(Option::take) {
            Some(mut hit) => {
                hit.score = entry.score;
                ordered.push(hit);
            }
            None => warn!(
                "Reranker returned unknown or repeated position {} ({})",
                entry.index, entry.id
            ),
        }
    }

    let dropped = slots.iter().filter(|slot| slot.is_some()).count();
    if dropped > 0 {
        debug!("{} hits fell below the rerank threshold", dropped);
    }

    ordered.extend(fallback);
    ordered
}
