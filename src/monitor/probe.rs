//! System Probe Module
//!
//! Source of the figures a snapshot needs beyond query latency:
//! connections, memory, cache hit rate and index counts.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::cache::SharedStore;
use crate::error::MonitorError;
use crate::monitor::{IndexRegistry, SystemFigures};

// == Probe Trait ==
#[async_trait]
pub trait SystemProbe: Send + Sync {
    async fn connection_count(&self) -> Result<usize, MonitorError>;

    async fn memory_usage(&self) -> Result<u64, MonitorError>;

    async fn cache_hit_rate(&self) -> Result<f64, MonitorError>;

    /// Collections to report index counts for.
    fn collections(&self) -> Vec<String>;

    async fn index_count(&self, collection: &str) -> Result<usize, MonitorError>;
}

// == Gather ==
/// Reads every figure from the probe.
///
/// A failing system-wide figure fails the whole gather. A failing collection
/// is logged and left out of the index counts.
pub async fn gather_figures(probe: &dyn SystemProbe) -> Result<SystemFigures, MonitorError> {
    let connection_count = probe.connection_count().await?;
    let memory_usage = probe.memory_usage().await?;
    let cache_hit_rate = probe.cache_hit_rate().await?;

    let mut index_count_by_collection = BTreeMap::new();
    for collection in probe.collections() {
        match probe.index_count(&collection).await {
            Ok(count) => {
                index_count_by_collection.insert(collection, count);
            }
            Err(e) => warn!("Skipping index stats for '{}': {}", collection, e),
        }
    }

    Ok(SystemFigures {
        connection_count,
        memory_usage,
        cache_hit_rate,
        index_count_by_collection,
    })
}

// == Connection Gauge ==
/// Count of requests currently in flight.
#[derive(Debug, Clone, Default)]
pub struct ConnectionGauge(Arc<AtomicUsize>);

impl ConnectionGauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks one connection open until the returned guard drops.
    pub fn enter(&self) -> ConnectionGuard {
        self.0.fetch_add(1, Ordering::SeqCst);
        ConnectionGuard(self.0.clone())
    }

    pub fn current(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug)]
pub struct ConnectionGuard(Arc<AtomicUsize>);

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

// == Local Probe ==
/// Probe over this process: in-flight requests, the TTL store and the
/// declared index registry.
#[derive(Debug, Clone)]
pub struct LocalProbe {
    store: SharedStore,
    connections: ConnectionGauge,
    indexes: Arc<IndexRegistry>,
}

impl LocalProbe {
    pub fn new(store: SharedStore, connections: ConnectionGauge, indexes: Arc<IndexRegistry>) -> Self {
        Self {
            store,
            connections,
            indexes,
        }
    }
}

#[async_trait]
impl SystemProbe for LocalProbe {
    async fn connection_count(&self) -> Result<usize, MonitorError> {
        Ok(self.connections.current())
    }

    async fn memory_usage(&self) -> Result<u64, MonitorError> {
        Ok(self.store.read().await.approx_memory_bytes() as u64)
    }

    /// An idle cache has missed nothing and reports 1.0.
    async fn cache_hit_rate(&self) -> Result<f64, MonitorError> {
        Ok(self.store.read().await.stats().hit_rate_or(1.0))
    }

    fn collections(&self) -> Vec<String> {
        self.indexes.collections()
    }

    async fn index_count(&self, collection: &str) -> Result<usize, MonitorError> {
        Ok(self.indexes.count_for(collection))
    }
}
