//! HTTP client for making requests to the vector backend

use super::retry::RetryPolicy;
use crate::config::{BackendSettings, RetrySettings};
use anyhow::Result;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Longest backend error body carried into an error message
const MAX_ERROR_BODY: usize = 512;

/// Failure of a single outgoing call
#[derive(Debug, Clone, Error, PartialEq)]
pub enum HttpError {
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("invalid request: {0}")]
    Request(String),
}

impl HttpError {
    /// Transport errors, timeouts, rate limiting and server errors may succeed later
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Decode(_) | Self::Request(_) => false,
        }
    }

    /// True when the backend answered with a well-formed 4xx refusal
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Status { status, .. } if (400..500).contains(status) && *status != 429)
    }

    fn from_reqwest(err: reqwest::Error, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout)
        } else if err.is_builder() {
            Self::Request(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// HTTP method
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// HTTP client wrapper carrying the backend credential and retry policy
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    api_key: String,
    api_version: String,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Create a new HTTP client from backend and retry settings
    pub fn with_settings(backend: &BackendSettings, retry: &RetrySettings) -> Result<Self> {
        let client = Client::builder()
            .timeout(backend.request_timeout())
            .user_agent(format!("docsearch-rs/{}", crate::VERSION))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            api_key: backend.api_key.clone().unwrap_or_default(),
            api_version: backend.api_version.clone(),
            retry: RetryPolicy::from_settings(retry),
        })
    }

    /// Replace the retry policy
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// GET a JSON document
    pub async fn get_json<T>(&self, url: &str, timeout: Duration) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        self.retry
            .run(url, || self.send_once(HttpMethod::Get, url, None, timeout))
            .await
    }

    /// POST a JSON body and decode a JSON response
    pub async fn post_json<B, T>(&self, url: &str, body: &B, timeout: Duration) -> Result<T, HttpError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_value(body).map_err(|e| HttpError::Request(e.to_string()))?;
        self.retry
            .run(url, || {
                self.send_once(HttpMethod::Post, url, Some(&body), timeout)
            })
            .await
    }

    async fn send_once<T>(
        &self,
        method: HttpMethod,
        url: &str,
        body: Option<&serde_json::Value>,
        timeout: Duration,
    ) -> Result<T, HttpError>
    where
        T: DeserializeOwned,
    {
        let mut req_builder = match method {
            HttpMethod::Get => self.client.get(url),
            HttpMethod::Post => self.client.post(url),
        };

        req_builder = req_builder
            .timeout(timeout)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", &self.api_version)
            .header("Accept", "application/json");

        if let Some(json) = body {
            req_builder = req_builder.json(json);
        }

        debug!("{:?} {}", method, url);

        let response = req_builder
            .send()
            .await
            .map_err(|e| HttpError::from_reqwest(e, timeout))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| HttpError::from_reqwest(e, timeout))?;

        if !status.is_success() {
            return Err(HttpError::Status {
                status: status.as_u16(),
                message: error_message(&text, status.canonical_reason()),
            });
        }

        serde_json::from_str(&text).map_err(|e| HttpError::Decode(e.to_string()))
    }
}

/// Pull a human-readable message out of a backend error body
fn error_message(body: &str, reason: Option<&str>) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        let message = json
            .pointer("/error/message")
            .or_else(|| json.get("message"))
            .or_else(|| json.get("error"))
            .and_then(|m| m.as_str());
        if let Some(message) = message {
            return message.to_string();
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return reason.unwrap_or("no response body").to_string();
    }
    trimmed.chars().take(MAX_ERROR_BODY).collect()
}
