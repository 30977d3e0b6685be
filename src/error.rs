//! Error types surfaced by the search pipeline

use thiserror::Error;

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, SearchError>;

/// Every way a single search or catalog call can fail.
///
/// Errors are local to one request: none of them touch the catalog snapshot
/// or leak into later requests.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SearchError {
    /// Bad input: empty query, out-of-range `top_k`, unknown index or namespace
    #[error("{0}")]
    InvalidRequest(String),

    /// Requested rerank model is not one of the supported identifiers
    #[error(
        "unknown rerank model: {0} (supported: {supported})",
        supported = crate::backends::RerankModel::identifiers().join(", ")
    )]
    UnknownModel(String),

    /// Transport failure or timeout against the query or catalog backend
    #[error("search backend is unavailable, please try again")]
    BackendUnavailable(String),

    /// Backend understood the request but refused it
    #[error("search backend rejected the request ({status}): {detail}")]
    BackendRejected { status: u16, detail: String },

    /// Reranking was requested but could not be performed
    #[error("reranking is unavailable, please try again")]
    RerankUnavailable(String),
}

impl SearchError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// Stable machine-readable code for the error envelope
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::UnknownModel(_) => "unknown_model",
            Self::BackendUnavailable(_) => "backend_unavailable",
            Self::BackendRejected { .. } => "backend_rejected",
            Self::RerankUnavailable(_) => "rerank_unavailable",
        }
    }

    /// HTTP status code used when the error reaches the web layer
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidRequest(_) | Self::UnknownModel(_) => 400,
            Self::BackendRejected { .. } => 502,
            Self::BackendUnavailable(_) | Self::RerankUnavailable(_) => 503,
        }
    }

    /// Whether the caller sent something that can never succeed as-is
    pub fn is_invalid_request(&self) -> bool {
        matches!(self, Self::InvalidRequest(_) | Self::UnknownModel(_))
    }

    /// Backend detail kept for logs; not part of the user-facing message
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::BackendUnavailable(detail) | Self::RerankUnavailable(detail) => Some(detail),
            Self::BackendRejected { detail, .. } => Some(detail),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_hides_detail() {
        let err = SearchError::BackendUnavailable("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "search backend is unavailable, please try again"
        );
        assert_eq!(err.detail(), Some("connection refused"));
        assert_eq!(err.status(), 503);
    }

    #[test]
    fn test_rejected_carries_detail() {
        let err = SearchError::BackendRejected {
            status: 400,
            detail: "bad filter".to_string(),
        };
        assert!(err.to_string().contains("bad filter"));
        assert_eq!(err.kind(), "backend_rejected");
        assert_eq!(err.status(), 502);
    }

    #[test]
    fn test_unknown_model_is_invalid_request() {
        let err = SearchError::UnknownModel("cohere-rerank-9".to_string());
        assert!(err.is_invalid_request());
        assert_eq!(err.status(), 400);
    }
}
