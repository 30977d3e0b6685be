//! Index directory backed by configuration

use super::traits::IndexDirectory;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;

/// Serves a fixed index -> namespaces map instead of asking the backend
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    indexes: BTreeMap<String, Vec<String>>,
}

impl StaticDirectory {
    pub fn new(indexes: BTreeMap<String, Vec<String>>) -> Self {
        Self { indexes }
    }
}

#[async_trait]
impl IndexDirectory for StaticDirectory {
    async fn list_indexes(&self) -> Result<Vec<String>> {
        Ok(self.indexes.keys().cloned().collect())
    }

    async fn list_namespaces(&self, index_name: &str) -> Result<Vec<String>> {
        Ok(self.indexes.get(index_name).cloned().unwrap_or_default())
    }
}
