//! HTTP request handlers

use super::state::AppState;
use crate::catalog::{Catalog, CatalogStatus};
use crate::config::SearchSettings;
use crate::error::{Result, SearchError};
use crate::metrics::MetricsSnapshot;
use crate::search::{Hit, SearchRequest, SearchResponse, Usage};
use axum::{extract::rejection::JsonRejection, extract::State, response::IntoResponse, Json};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON body of `POST /api/search`, before validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchPayload {
    pub query: Option<String>,
    pub rerank_model: Option<String>,
    /// Kept loose so non-numeric input is reported, not rejected by serde
    pub top_k: Option<Value>,
    pub index_name: Option<String>,
    pub namespace: Option<String>,
}

impl SearchPayload {
    /// Resolve defaults and parse `top_k`; range checks happen in the executor
    pub fn into_request(self, defaults: &SearchSettings) -> Result<SearchRequest> {
        let top_k = parse_top_k(self.top_k.as_ref(), defaults.default_top_k)?;

        let index_name = non_empty(self.index_name)
            .or_else(|| defaults.default_index.clone())
            .ok_or_else(|| SearchError::invalid("index_name is required"))?;
        let namespace = non_empty(self.namespace)
            .or_else(|| defaults.default_namespace.clone())
            .ok_or_else(|| SearchError::invalid("namespace is required"))?;

        Ok(SearchRequest::new(self.query.unwrap_or_default(), index_name, namespace)
            .with_top_k(top_k)
            .with_rerank_model(self.rerank_model.unwrap_or_default()))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_top_k(value: Option<&Value>, default: u32) -> Result<i64> {
    let invalid = || {
        SearchError::invalid(format!(
            "top_k must be an integer between {} and {}",
            crate::MIN_TOP_K,
            crate::MAX_TOP_K
        ))
    };
    match value {
        None | Some(Value::Null) => Ok(default as i64),
        Some(Value::Number(n)) => n.as_i64().ok_or_else(invalid),
        Some(Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}

/// Wire shape of a successful search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEnvelope {
    pub result: HitList,
    pub usage: Usage,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HitList {
    pub hits: Vec<Hit>,
}

impl From<SearchResponse> for SearchEnvelope {
    fn from(response: SearchResponse) -> Self {
        Self {
            result: HitList {
                hits: response.hits,
            },
            usage: response.usage,
        }
    }
}

/// Catalog response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexesResponse {
    pub indexes: Catalog,
}

/// Search handler
pub async fn search(
    State(state): State<AppState>,
    payload: std::result::Result<Json<SearchPayload>, JsonRejection>,
) -> Result<Json<SearchEnvelope>> {
    let Json(payload) = payload
        .map_err(|e| SearchError::invalid(format!("invalid request body: {}", e.body_text())))?;

    let request = payload.into_request(&state.settings.search)?;
    let response = state.search.execute(&request).await?;

    Ok(Json(SearchEnvelope::from(response)))
}

/// Catalog handler; loads the catalog on first use and replaces a stale one
pub async fn list_indexes(State(state): State<AppState>) -> Result<Json<IndexesResponse>> {
    let catalog = state.catalog().ensure_fresh().await?;
    Ok(Json(IndexesResponse {
        indexes: catalog.as_ref().clone(),
    }))
}

/// Explicit catalog refresh
pub async fn refresh_indexes(State(state): State<AppState>) -> Result<Json<IndexesResponse>> {
    let catalog = state.catalog().refresh().await?;
    Ok(Json(IndexesResponse {
        indexes: catalog.as_ref().clone(),
    }))
}

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub catalog: CatalogStatus,
    pub indexes: usize,
    #[serde(flatten)]
    pub metrics: MetricsSnapshot,
}

/// Stats handler
pub async fn stats(State(state): State<AppState>) -> impl IntoResponse {
    let catalog = state.catalog();
    Json(StatsResponse {
        catalog: catalog.status(),
        indexes: catalog.current().map(|c| c.len()).unwrap_or(0),
        metrics: state.search.metrics().snapshot(),
    })
}

/// Health check handler
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "instance": state.instance_name(),
        "version": crate::VERSION
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: Value) -> SearchPayload {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_payload_defaults_top_k() {
        let request = payload(json!({
            "query": "camera setup",
            "index_name": "verkada-docs",
            "namespace": "verkada-docs"
        }))
        .into_request(&SearchSettings::default())
        .unwrap();

        assert_eq!(request.top_k, 10);
        assert_eq!(request.rerank_model(), None);
    }

    #[test]
    fn test_payload_accepts_integer_strings() {
        let request = payload(json!({
            "query": "q", "index_name": "i", "namespace": "n", "top_k": " 7 "
        }))
        .into_request(&SearchSettings::default())
        .unwrap();
        assert_eq!(request.top_k, 7);
    }

    #[test]
    fn test_payload_rejects_non_numeric_top_k() {
        for top_k in [json!("ten"), json!(2.5), json!(true), json!([5])] {
            let err = payload(json!({
                "query": "q", "index_name": "i", "namespace": "n", "top_k": top_k
            }))
            .into_request(&SearchSettings::default())
            .unwrap_err();
            assert!(err.is_invalid_request());
        }
    }

    #[test]
    fn test_out_of_range_number_names_bounds() {
        let err = payload(json!({
            "query": "q", "index_name": "i", "namespace": "n", "top_k": 1e20
        }))
        .into_request(&SearchSettings::default())
        .unwrap_err();
        assert_eq!(err, SearchError::invalid("top_k must be an integer between 1 and 50"));
    }

    #[test]
    fn test_payload_does_not_clamp() {
        let request = payload(json!({
            "query": "q", "index_name": "i", "namespace": "n", "top_k": 500
        }))
        .into_request(&SearchSettings::default())
        .unwrap();
        assert_eq!(request.top_k, 500);
    }

    #[test]
    fn test_payload_index_defaults() {
        let defaults = SearchSettings {
            default_index: Some("verkada-docs".to_string()),
            default_namespace: Some("verkada-docs".to_string()),
            ..Default::default()
        };
        let request = payload(json!({"query": "q", "index_name": ""}))
            .into_request(&defaults)
            .unwrap();
        assert_eq!(request.index_name, "verkada-docs");
        assert_eq!(request.namespace, "verkada-docs");

        let err = payload(json!({"query": "q"}))
            .into_request(&SearchSettings::default())
            .unwrap_err();
        assert_eq!(err, SearchError::invalid("index_name is required"));
    }

    #[test]
    fn test_envelope_shape() {
        let envelope = SearchEnvelope::from(SearchResponse {
            hits: vec![Hit::new("a", 0.4).with_text("hello")],
            usage: [("read_units", 1)].into_iter().collect(),
        });
        assert_eq!(
            serde_json::to_value(&envelope).unwrap(),
            json!({
                "result": {"hits": [{"_id": "a", "_score": 0.4, "fields": {"text": "hello"}}]},
                "usage": {"read_units": 1}
            })
        );
    }
}
