//! Application state shared across handlers

use crate::backends::{IndexDirectory, Pinecone, Reranker, StaticDirectory, VectorStore};
use crate::catalog::{CatalogHandle, CatalogService};
use crate::config::Settings;
use crate::search::Search;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Global settings
    pub settings: Arc<Settings>,
    /// Search executor, owner of the catalog snapshot
    pub search: Arc<Search>,
}

impl AppState {
    /// Wire every backend role to one Pinecone client, unless the catalog is static
    pub fn new(settings: Settings, pinecone: Arc<Pinecone>) -> Self {
        let directory: Arc<dyn IndexDirectory> = if settings.catalog.is_static() {
            Arc::new(StaticDirectory::new(settings.catalog.indexes.clone()))
        } else {
            pinecone.clone()
        };
        Self::from_parts(settings, pinecone.clone(), pinecone, directory)
    }

    /// Build state from explicit backend implementations
    pub fn from_parts(
        settings: Settings,
        vectors: Arc<dyn VectorStore>,
        reranker: Arc<dyn Reranker>,
        directory: Arc<dyn IndexDirectory>,
    ) -> Self {
        let catalog = Arc::new(CatalogHandle::new(CatalogService::new(directory)));
        let search = Arc::new(Search::new(vectors, reranker, catalog));

        Self {
            settings: Arc::new(settings),
            search,
        }
    }

    /// Catalog snapshot owner
    pub fn catalog(&self) -> &Arc<CatalogHandle> {
        self.search.catalog()
    }

    /// Get instance name
    pub fn instance_name(&self) -> &str {
        &self.settings.general.instance_name
    }
}
