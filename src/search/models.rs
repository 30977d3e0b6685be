//! Search request, hit and usage data models

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A validated-on-execute search request.
///
/// `top_k` is kept signed so out-of-range input reaches the executor's
/// bounds check instead of being wrapped or clamped on the way in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query
    pub query: String,
    /// Index to search
    pub index_name: String,
    /// Namespace within the index
    pub namespace: String,
    /// Requested hit count
    pub top_k: i64,
    /// Rerank model identifier; `None` disables reranking
    pub rerank_model: Option<String>,
}

impl SearchRequest {
    pub fn new(
        query: impl Into<String>,
        index_name: impl Into<String>,
        namespace: impl Into<String>,
    ) -> Self {
        Self {
            query: query.into(),
            index_name: index_name.into(),
            namespace: namespace.into(),
            top_k: crate::DEFAULT_TOP_K as i64,
            rerank_model: None,
        }
    }

    /// Set requested hit count
    pub fn with_top_k(mut self, top_k: i64) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set rerank model; an empty identifier means no reranking
    pub fn with_rerank_model(mut self, model: impl Into<String>) -> Self {
        let model = model.into();
        self.rerank_model = if model.trim().is_empty() {
            None
        } else {
            Some(model)
        };
        self
    }

    /// Rerank model if one was asked for
    pub fn rerank_model(&self) -> Option<&str> {
        self.rerank_model
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// One scored document returned by a similarity query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Opaque backend identifier
    #[serde(rename = "_id", default)]
    pub id: String,
    /// Relevance score on the backend's (or reranker's) scale
    #[serde(rename = "_score", default)]
    pub score: f64,
    /// Record fields
    #[serde(default)]
    pub fields: HitFields,
}

impl Hit {
    pub fn new(id: impl Into<String>, score: f64) -> Self {
        Self {
            id: id.into(),
            score,
            fields: HitFields::default(),
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.fields.text = Some(text.into());
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.fields.url = Some(url.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.fields.description = Some(description.into());
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.fields.url.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.description.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.fields.text.as_deref()
    }

    /// Text usable as reranking input, if the hit has any
    pub fn rerank_text(&self) -> Option<&str> {
        self.text().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Known record fields plus everything else the backend returned
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HitFields {
    #[serde(
        default,
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub url: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "loose_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub text: Option<String>,
    /// Fields this crate has no typed accessor for
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl HitFields {
    pub fn get_extra(&self, key: &str) -> Option<&Value> {
        self.extra.get(key)
    }
}

/// Accept a string, a list (first element wins) or a scalar; trim, and treat blank as absent
fn loose_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(text_of))
}

fn text_of(value: Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s,
        Value::Array(items) => return items.into_iter().next().and_then(text_of),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(_) => return None,
    };
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Backend-reported resource accounting, keyed by unit name.
///
/// Values stay as the backend reported them: integers remain exact and
/// fractional units pass through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Usage(BTreeMap<String, Number>);

impl Usage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep the numeric entries of a backend usage object
    pub fn from_json(map: &Map<String, Value>) -> Self {
        Self(
            map.iter()
                .filter_map(|(key, value)| match value {
                    Value::Number(n) => Some((key.clone(), n.clone())),
                    _ => None,
                })
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<f64> {
        self.0.get(key).and_then(Number::as_f64)
    }

    /// Add every entry of `other`, summing keys present in both
    pub fn merge(&mut self, other: &Usage) {
        for (key, value) in &other.0 {
            let sum = match self.0.get(key) {
                Some(current) => add_numbers(current, value),
                None => value.clone(),
            };
            self.0.insert(key.clone(), sum);
        }
    }

    pub fn merged(mut self, other: &Usage) -> Self {
        self.merge(other);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl<K: Into<String>, V: Into<Number>> FromIterator<(K, V)> for Usage {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Integer sums stay integral until they overflow; anything else is summed as f64
fn add_numbers(a: &Number, b: &Number) -> Number {
    if let Some(sum) = a.as_u64().zip(b.as_u64()).and_then(|(x, y)| x.checked_add(y)) {
        return sum.into();
    }
    if let Some(sum) = a.as_i64().zip(b.as_i64()).and_then(|(x, y)| x.checked_add(y)) {
        return sum.into();
    }
    let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
    Number::from_f64(sum).unwrap_or_else(|| a.clone())
}

/// Final, user-facing result of one search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResponse {
    /// Hits in rank order, most relevant first
    pub hits: Vec<Hit>,
    /// Merged usage of every backend call made for this search
    pub usage: Usage,
}

impl SearchResponse {
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}
