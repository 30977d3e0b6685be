//! Immutable index/namespace catalog

use crate::error::{Result, SearchError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Discovered indexes and their namespaces.
///
/// Never mutated once built; a refresh produces a new value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    indexes: BTreeMap<String, BTreeSet<String>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an index with its namespaces (builder style, used while discovering)
    pub fn with_index<I, S>(mut self, index_name: impl Into<String>, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes
            .entry(index_name.into())
            .or_default()
            .extend(namespaces.into_iter().map(Into::into));
        self
    }

    pub fn contains_index(&self, index_name: &str) -> bool {
        self.indexes.contains_key(index_name)
    }

    pub fn contains(&self, index_name: &str, namespace: &str) -> bool {
        self.indexes
            .get(index_name)
            .is_some_and(|namespaces| namespaces.contains(namespace))
    }

    pub fn namespaces(&self, index_name: &str) -> Option<&BTreeSet<String>> {
        self.indexes.get(index_name)
    }

    pub fn len(&self) -> usize {
        self.indexes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indexes.is_empty()
    }

    /// Fail with `InvalidRequest` unless the pair is in this snapshot
    pub fn check(&self, index_name: &str, namespace: &str) -> Result<()> {
        match self.indexes.get(index_name) {
            None => Err(SearchError::invalid(format!("unknown index: {}", index_name))),
            Some(namespaces) if namespaces.contains(namespace) => Ok(()),
            Some(_) => Err(SearchError::invalid(format!(
                "unknown namespace '{}' for index '{}'",
                namespace, index_name
            ))),
        }
    }
}
