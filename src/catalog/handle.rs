//! Process-wide catalog snapshot with copy-on-write refresh

use super::service::CatalogService;
use super::snapshot::Catalog;
use crate::error::Result;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Lifecycle of the shared snapshot
#[derive(Debug, Clone, Default)]
pub enum CatalogState {
    #[default]
    Uninitialized,
    Loaded(Arc<Catalog>),
    /// Still served to readers until the next refresh replaces it
    Stale(Arc<Catalog>),
}

impl CatalogState {
    pub fn snapshot(&self) -> Option<Arc<Catalog>> {
        match self {
            Self::Uninitialized => None,
            Self::Loaded(catalog) | Self::Stale(catalog) => Some(catalog.clone()),
        }
    }

    pub fn status(&self) -> CatalogStatus {
        match self {
            Self::Uninitialized => CatalogStatus::Uninitialized,
            Self::Loaded(_) => CatalogStatus::Loaded,
            Self::Stale(_) => CatalogStatus::Stale,
        }
    }
}

/// Data-free view of [`CatalogState`] for reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    Uninitialized,
    Loaded,
    Stale,
}

/// Owner of the current catalog snapshot.
///
/// Readers clone the `Arc` under a short read lock and never observe a
/// half-built catalog. Refreshes are serialized by `refresh_lock`, build
/// the new catalog without holding the state lock, then swap it in.
pub struct CatalogHandle {
    service: CatalogService,
    state: RwLock<CatalogState>,
    refresh_lock: Mutex<()>,
}

impl CatalogHandle {
    pub fn new(service: CatalogService) -> Self {
        Self {
            service,
            state: RwLock::new(CatalogState::Uninitialized),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Current snapshot, if one has been loaded
    pub fn current(&self) -> Option<Arc<Catalog>> {
        self.read_state().snapshot()
    }

    pub fn status(&self) -> CatalogStatus {
        self.read_state().status()
    }

    /// Discover a new catalog and publish it, replacing the old one.
    ///
    /// On failure the previous state is kept as-is.
    pub async fn refresh(&self) -> Result<Arc<Catalog>> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked().await
    }

    /// Return the snapshot, loading it once if nothing has been loaded yet
    pub async fn ensure_loaded(&self) -> Result<Arc<Catalog>> {
        if let Some(catalog) = self.current() {
            return Ok(catalog);
        }

        let _guard = self.refresh_lock.lock().await;
        // Another caller may have loaded it while we waited
        if let Some(catalog) = self.current() {
            return Ok(catalog);
        }
        self.refresh_locked().await
    }

    /// Like [`ensure_loaded`](Self::ensure_loaded), but also refreshes a stale snapshot
    pub async fn ensure_fresh(&self) -> Result<Arc<Catalog>> {
        if let Some(catalog) = self.loaded() {
            return Ok(catalog);
        }

        let _guard = self.refresh_lock.lock().await;
        if let Some(catalog) = self.loaded() {
            return Ok(catalog);
        }
        self.refresh_locked().await
    }

    /// Flag the snapshot for replacement on the next on-demand refresh
    pub fn mark_stale(&self) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        *state = match std::mem::take(&mut *state) {
            CatalogState::Loaded(catalog) => {
                info!("Catalog marked stale");
                CatalogState::Stale(catalog)
            }
            other => other,
        };
    }

    /// Snapshot only if it is loaded and not stale
    fn loaded(&self) -> Option<Arc<Catalog>> {
        match &*self.read_state() {
            CatalogState::Loaded(catalog) => Some(catalog.clone()),
            _ => None,
        }
    }

    async fn refresh_locked(&self) -> Result<Arc<Catalog>> {
        let catalog = match self.service.discover().await {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                warn!("Catalog discovery failed: {}", e);
                return Err(e);
            }
        };

        *self.state.write().unwrap_or_else(PoisonError::into_inner) =
            CatalogState::Loaded(catalog.clone());
        Ok(catalog)
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, CatalogState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }
}
