//! Pinecone backend implementation
//!
//! Uses Pinecone's REST API: integrated-embedding record search on the data
//! plane, hosted reranking and index listing on the control plane.

use super::rerank_model::RerankModel;
use super::traits::*;
use crate::config::Settings;
use crate::error::{Result, SearchError};
use crate::network::{HttpClient, HttpError};
use crate::search::{Hit, Usage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock};
use std::time::Duration;
use tracing::{debug, info};

/// Pinecone client serving as vector store, reranker and index directory
pub struct Pinecone {
    http: HttpClient,
    control_url: String,
    request_timeout: Duration,
    rerank_timeout: Duration,
    fields: Vec<String>,
    /// Configured data plane hosts; take precedence over discovered ones
    host_overrides: HashMap<String, String>,
    /// Data plane hosts learned from the control plane
    hosts: RwLock<HashMap<String, String>>,
}

impl Pinecone {
    pub fn new(http: HttpClient, settings: &Settings) -> Self {
        Self {
            http,
            control_url: settings.backend.control_url.trim_end_matches('/').to_string(),
            request_timeout: settings.backend.request_timeout(),
            rerank_timeout: settings.backend.rerank_timeout(),
            fields: settings.search.fields.clone(),
            host_overrides: settings
                .backend
                .index_hosts
                .iter()
                .map(|(name, host)| (name.clone(), normalize_host(host)))
                .collect(),
            hosts: RwLock::new(HashMap::new()),
        }
    }

    fn control(&self, path: &str) -> String {
        format!("{}{}", self.control_url, path)
    }

    fn remember_host(&self, index_name: &str, host: &str) {
        if host.is_empty() {
            return;
        }
        self.hosts
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(index_name.to_string(), normalize_host(host));
    }

    fn known_host(&self, index_name: &str) -> Option<String> {
        if let Some(host) = self.host_overrides.get(index_name) {
            return Some(host.clone());
        }
        self.hosts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(index_name)
            .cloned()
    }

    /// Data plane base URL of an index
    async fn index_host(&self, index_name: &str) -> Result<String> {
        if let Some(host) = self.known_host(index_name) {
            return Ok(host);
        }

        let url = self.control(&format!("/indexes/{}", urlencoding::encode(index_name)));
        let description: IndexDescription = self
            .http
            .get_json(&url, self.request_timeout)
            .await
            .map_err(|e| backend_error("describe index", e))?;

        if description.host.is_empty() {
            return Err(SearchError::BackendUnavailable(format!(
                "index {} has no data plane host yet",
                index_name
            )));
        }

        info!("Resolved host for index {}: {}", index_name, description.host);
        self.remember_host(index_name, &description.host);
        Ok(normalize_host(&description.host))
    }
}

#[async_trait]
impl VectorStore for Pinecone {
    fn name(&self) -> &str {
        "pinecone"
    }

    async fn query(&self, query: &VectorQuery) -> Result<QueryOutcome> {
        let host = self.index_host(&query.index_name).await?;
        let url = format!(
            "{}/records/namespaces/{}/search",
            host,
            urlencoding::encode(&query.namespace)
        );

        let body = SearchRecordsBody {
            query: SearchRecordsQuery {
                inputs: QueryInputs { text: &query.text },
                top_k: query.top_k,
            },
            fields: &self.fields,
        };

        let response: SearchRecordsResponse = self
            .http
            .post_json(&url, &body, self.request_timeout)
            .await
            .map_err(|e| backend_error("search records", e))?;

        debug!(
            "Pinecone returned {} hits for {}/{}",
            response.result.hits.len(),
            query.index_name,
            query.namespace
        );

        Ok(QueryOutcome {
            hits: response.result.hits,
            usage: Usage::from_json(&response.usage),
        })
    }
}

#[async_trait]
impl Reranker for Pinecone {
    async fn rerank(
        &self,
        query: &str,
        model: RerankModel,
        candidates: &[RerankCandidate],
    ) -> Result<RerankOutcome> {
        if candidates.is_empty() {
            return Ok(RerankOutcome::default());
        }

        let body = RerankBody {
            model: model.as_str(),
            query,
            documents: candidates
                .iter()
                .map(|c| RerankDocument {
                    id: &c.id,
                    text: &c.text,
                })
                .collect(),
            top_n: candidates.len(),
            rank_fields: ["text"],
            return_documents: false,
        };

        let response: RerankResponse = self
            .http
            .post_json(&self.control("/rerank"), &body, self.rerank_timeout)
            .await
            .map_err(|e| SearchError::RerankUnavailable(format!("rerank with {}: {}", model, e)))?;

        let ranked = response
            .data
            .into_iter()
            .map(|doc| {
                candidates
                    .get(doc.index)
                    .map(|c| RankedId::new(doc.index, c.id.clone(), doc.score))
                    .ok_or_else(|| {
                        SearchError::RerankUnavailable(format!(
                            "reranker returned unknown document index {}",
                            doc.index
                        ))
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(RerankOutcome {
            ranked,
            usage: Usage::from_json(&response.usage),
        })
    }
}

#[async_trait]
impl IndexDirectory for Pinecone {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        let list: IndexList = self
            .http
            .get_json(&self.control("/indexes"), self.request_timeout)
            .await
            .map_err(|e| backend_error("list indexes", e))?;

        let mut names = Vec::with_capacity(list.indexes.len());
        for index in list.indexes {
            self.remember_host(&index.name, &index.host);
            names.push(index.name);
        }
        Ok(names)
    }

    async fn list_namespaces(&self, index_name: &str) -> Result<Vec<String>> {
        let host = self.index_host(index_name).await?;
        let stats: IndexStats = self
            .http
            .post_json(
                &format!("{}/describe_index_stats", host),
                &serde_json::json!({}),
                self.request_timeout,
            )
            .await
            .map_err(|e| backend_error("describe index stats", e))?;

        // The default namespace has no name and cannot be addressed by search
        Ok(stats
            .namespaces
            .into_keys()
            .filter(|name| !name.is_empty())
            .collect())
    }
}

/// Translate an outgoing call failure into the query/catalog error kinds
fn backend_error(operation: &str, err: HttpError) -> SearchError {
    if err.is_rejection() {
        if let HttpError::Status { status, message } = err {
            return SearchError::BackendRejected {
                status,
                detail: message,
            };
        }
    }
    SearchError::BackendUnavailable(format!("{}: {}", operation, err))
}

/// Hosts come back without a scheme from the control plane
fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("https://{}", host)
    }
}

#[derive(Serialize)]
struct SearchRecordsBody<'a> {
    query: SearchRecordsQuery<'a>,
    fields: &'a [String],
}

#[derive(Serialize)]
struct SearchRecordsQuery<'a> {
    inputs: QueryInputs<'a>,
    top_k: u32,
}

#[derive(Serialize)]
struct QueryInputs<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct SearchRecordsResponse {
    result: SearchRecordsResult,
    #[serde(default)]
    usage: Map<String, Value>,
}

#[derive(Deserialize)]
struct SearchRecordsResult {
    #[serde(default)]
    hits: Vec<Hit>,
}

#[derive(Serialize)]
struct RerankBody<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<RerankDocument<'a>>,
    top_n: usize,
    rank_fields: [&'static str; 1],
    return_documents: bool,
}

#[derive(Serialize)]
struct RerankDocument<'a> {
    id: &'a str,
    text: &'a str,
}

#[derive(Deserialize)]
struct RerankResponse {
    #[serde(default)]
    data: Vec<RankedDocument>,
    #[serde(default)]
    usage: Map<String, Value>,
}

#[derive(Deserialize)]
struct RankedDocument {
    index: usize,
    score: f64,
}

#[derive(Deserialize)]
struct IndexList {
    #[serde(default)]
    indexes: Vec<IndexDescription>,
}

#[derive(Deserialize)]
struct IndexDescription {
    name: String,
    #[serde(default)]
    host: String,
}

#[derive(Deserialize)]
struct IndexStats {
    #[serde(default)]
    namespaces: BTreeMap<String, Value>,
}
