//! Catalog discovery

use super::snapshot::Catalog;
use crate::backends::IndexDirectory;
use crate::error::Result;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::info;

/// Enumerates every index and, per index, every namespace
#[derive(Clone)]
pub struct CatalogService {
    directory: Arc<dyn IndexDirectory>,
}

impl CatalogService {
    pub fn new(directory: Arc<dyn IndexDirectory>) -> Self {
        Self { directory }
    }

    /// Build a complete catalog, or fail without a partial result
    pub async fn discover(&self) -> Result<Catalog> {
        let index_names = self.directory.list_indexes().await?;

        let lookups = index_names.iter().map(|name| async move {
            let namespaces = self.directory.list_namespaces(name).await?;
            Ok::<_, crate::error::SearchError>((name.clone(), namespaces))
        });

        let catalog = try_join_all(lookups)
            .await?
            .into_iter()
            .fold(Catalog::new(), |catalog, (name, namespaces)| {
                catalog.with_index(name, namespaces)
            });

        info!("Discovered {} indexes", catalog.len());
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SearchError;
    use async_trait::async_trait;

    struct FlakyDirectory;

    #[async_trait]
    impl IndexDirectory for FlakyDirectory {
        async fn list_indexes(&self) -> Result<Vec<String>> {
            Ok(vec!["good".to_string(), "bad".to_string()])
        }

        async fn list_namespaces(&self, index_name: &str) -> Result<Vec<String>> {
            match index_name {
                "good" => Ok(vec!["ns".to_string()]),
                _ => Err(SearchError::BackendUnavailable("stats timed out".to_string())),
            }
        }
    }

    #[tokio::test]
    async fn test_discover_is_all_or_nothing() {
        let service = CatalogService::new(Arc::new(FlakyDirectory));
        let err = service.discover().await.unwrap_err();
        assert_eq!(err.kind(), "backend_unavailable");
    }
}
