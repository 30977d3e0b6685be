//! Supported reranking models

use crate::error::SearchError;
use std::fmt;
use std::str::FromStr;

/// Fixed set of hosted rerank models accepted by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RerankModel {
    BgeRerankerV2M3,
    CohereRerank35,
    PineconeRerankV0,
}

impl RerankModel {
    pub const ALL: [RerankModel; 3] = [
        RerankModel::BgeRerankerV2M3,
        RerankModel::CohereRerank35,
        RerankModel::PineconeRerankV0,
    ];

    /// Backend identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BgeRerankerV2M3 => "bge-reranker-v2-m3",
            Self::CohereRerank35 => "cohere-rerank-3.5",
            Self::PineconeRerankV0 => "pinecone-rerank-v0",
        }
    }

    /// Identifiers of every supported model
    pub fn identifiers() -> Vec<&'static str> {
        Self::ALL.iter().map(|m| m.as_str()).collect()
    }
}

impl FromStr for RerankModel {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| SearchError::UnknownModel(s.to_string()))
    }
}

impl fmt::Display for RerankModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
