//! Metrics collection module
//!
//! Tracks search volume, failures by kind, latency and accumulated backend usage.

use crate::search::Usage;
use serde::Serialize;
use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Number of recent latencies kept for the rolling average
const LATENCY_WINDOW: usize = 100;

/// Process-wide search metrics
pub struct Metrics {
    /// Total search count
    total_searches: AtomicU64,
    /// Searches that asked for reranking
    reranked_searches: AtomicU64,
    /// Failures by error kind
    failures: RwLock<BTreeMap<String, u64>>,
    /// Recent successful search latencies in ms
    response_times: RwLock<VecDeque<u64>>,
    /// Usage summed over every successful search
    usage: RwLock<Usage>,
}

impl Metrics {
    /// Create a new metrics instance
    pub fn new() -> Self {
        Self {
            total_searches: AtomicU64::new(0),
            reranked_searches: AtomicU64::new(0),
            failures: RwLock::new(BTreeMap::new()),
            response_times: RwLock::new(VecDeque::with_capacity(LATENCY_WINDOW)),
            usage: RwLock::new(Usage::new()),
        }
    }

    /// Count an incoming search
    pub fn record_search(&self, reranked: bool) {
        self.total_searches.fetch_add(1, Ordering::Relaxed);
        if reranked {
            self.reranked_searches.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a successful search
    pub fn record_success(&self, time_ms: u64, usage: &Usage) {
        {
            let mut times = self
                .response_times
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if times.len() >= LATENCY_WINDOW {
                times.pop_front();
            }
            times.push_back(time_ms);
        }

        self.usage
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(usage);
    }

    /// Record a failed search
    pub fn record_failure(&self, kind: &str) {
        let mut failures = self.failures.write().unwrap_or_else(PoisonError::into_inner);
        *failures.entry(kind.to_string()).or_insert(0) += 1;
    }

    /// Get total searches
    pub fn total_searches(&self) -> u64 {
        self.total_searches.load(Ordering::Relaxed)
    }

    /// Average latency over the recent window
    pub fn avg_response_time(&self) -> Option<u64> {
        let times = self
            .response_times
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        if times.is_empty() {
            None
        } else {
            Some(times.iter().sum::<u64>() / times.len() as u64)
        }
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_searches: self.total_searches(),
            reranked_searches: self.reranked_searches.load(Ordering::Relaxed),
            failures: self
                .failures
                .read()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            avg_response_time_ms: self.avg_response_time(),
            usage: self.usage.read().unwrap_or_else(PoisonError::into_inner).clone(),
        }
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Serializable metrics view served by the stats endpoint
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_searches: u64,
    pub reranked_searches: u64,
    pub failures: BTreeMap<String, u64>,
    pub avg_response_time_ms: Option<u64>,
    pub usage: Usage,
}
