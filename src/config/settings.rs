//! Settings structures for DocSearch-RS configuration

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Duration;

/// Main settings structure loaded from settings.yml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub general: GeneralSettings,
    pub server: ServerSettings,
    pub backend: BackendSettings,
    pub retry: RetrySettings,
    pub search: SearchSettings,
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Load settings from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// Parse settings from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let settings: Settings = serde_yaml::from_str(content)?;
        Ok(settings)
    }

    /// Merge with environment variables
    pub fn merge_env(&mut self) {
        if let Ok(val) = std::env::var("DOCSEARCH_DEBUG") {
            self.general.debug = val.parse().unwrap_or(false);
        }
        if let Ok(val) = std::env::var("DOCSEARCH_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }
        if let Ok(val) = std::env::var("DOCSEARCH_BIND_ADDRESS") {
            self.server.bind_address = val;
        }
        if let Ok(val) = std::env::var("DOCSEARCH_CONTROL_URL") {
            self.backend.control_url = val;
        }
        if let Ok(val) = std::env::var("PINECONE_API_KEY") {
            if !val.trim().is_empty() {
                self.backend.api_key = Some(val);
            }
        }
    }

    /// Check settings that would otherwise fail on the first request
    pub fn validate(&self) -> Result<()> {
        // Queries always hit the backend, even with a static catalog
        if self.backend.api_key.as_deref().map_or(true, str::is_empty) {
            bail!("backend.api_key is not set (use PINECONE_API_KEY)");
        }
        if !(crate::MIN_TOP_K..=crate::MAX_TOP_K).contains(&self.search.default_top_k) {
            bail!(
                "search.default_top_k must be within {}..={}, got {}",
                crate::MIN_TOP_K,
                crate::MAX_TOP_K,
                self.search.default_top_k
            );
        }
        let positive = |secs: f64| secs.is_finite() && secs > 0.0;
        if !positive(self.backend.request_timeout) || !positive(self.backend.rerank_timeout) {
            bail!("backend timeouts must be positive and finite");
        }
        let retry = &self.retry;
        if ![retry.initial_delay, retry.max_delay, retry.exponential_base]
            .iter()
            .all(|v| v.is_finite() && *v >= 0.0)
        {
            bail!("retry delays and exponential_base must be finite and non-negative");
        }
        if url::Url::parse(&self.backend.control_url).is_err() {
            bail!("backend.control_url is not a valid URL: {}", self.backend.control_url);
        }
        Ok(())
    }
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralSettings {
    /// Enable debug logging
    pub debug: bool,
    /// Instance name reported by the health endpoint
    pub instance_name: String,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            instance_name: "DocSearch".to_string(),
        }
    }
}

/// Server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Server port
    pub port: u16,
    /// Bind address
    pub bind_address: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            port: 5000,
            bind_address: "127.0.0.1".to_string(),
        }
    }
}

/// Vector backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendSettings {
    /// API credential, normally supplied via PINECONE_API_KEY
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Control plane base URL (index listing, reranking)
    pub control_url: String,
    /// Value of the X-Pinecone-API-Version header
    pub api_version: String,
    /// Timeout for query and catalog calls in seconds
    pub request_timeout: f64,
    /// Timeout for rerank calls in seconds
    pub rerank_timeout: f64,
    /// Data plane host overrides by index name
    pub index_hosts: HashMap<String, String>,
}

impl BackendSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    pub fn rerank_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.rerank_timeout)
    }
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            control_url: "https://api.pinecone.io".to_string(),
            api_version: "2025-01".to_string(),
            request_timeout: 10.0,
            rerank_timeout: 10.0,
            index_hosts: HashMap::new(),
        }
    }
}

/// Retry behaviour of outgoing backend calls
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Retries after the first attempt (0 disables retrying)
    pub max_retries: u32,
    /// Delay before the first retry in seconds
    pub initial_delay: f64,
    /// Upper bound for a single delay in seconds
    pub max_delay: f64,
    /// Multiplier applied per retry
    pub exponential_base: f64,
    /// Randomize each delay between 50% and 150%
    pub jitter: bool,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 2,
            initial_delay: 0.25,
            max_delay: 4.0,
            exponential_base: 2.0,
            jitter: true,
        }
    }
}

/// Search request defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Hit count used when a request leaves top_k out
    pub default_top_k: u32,
    /// Index used when a request leaves index_name out
    pub default_index: Option<String>,
    /// Namespace used when a request leaves namespace out
    pub default_namespace: Option<String>,
    /// Record fields requested from the backend
    pub fields: Vec<String>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_top_k: crate::DEFAULT_TOP_K,
            default_index: None,
            default_namespace: None,
            fields: vec![
                "text".to_string(),
                "url".to_string(),
                "description".to_string(),
            ],
        }
    }
}

/// Catalog discovery settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Fixed index -> namespaces map; replaces backend discovery when non-empty
    pub indexes: BTreeMap<String, Vec<String>>,
}

impl CatalogSettings {
    pub fn is_static(&self) -> bool {
        !self.indexes.is_empty()
    }
}
