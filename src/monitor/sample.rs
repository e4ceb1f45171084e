//! Monitor Data Module
//!
//! Latency samples, health snapshots and the aggregates derived from them.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

// == Latency Sample ==
/// One timed operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LatencySample {
    pub operation_name: String,
    pub collection: String,
    pub operation: String,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
}

// == System Figures ==
/// Figures the monitor cannot measure itself and receives from a probe.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemFigures {
    pub connection_count: usize,
    pub memory_usage: u64,
    pub cache_hit_rate: f64,
    pub index_count_by_collection: BTreeMap<String, usize>,
}

// == Health Snapshot ==
/// Point-in-time aggregation used to judge operational health.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSnapshot {
    pub timestamp: DateTime<Utc>,
    pub connection_count: usize,
    pub query_count: usize,
    /// Mean duration of the most recent samples, in milliseconds
    pub average_query_time: f64,
    pub slow_query_count: usize,
    pub cache_hit_rate: f64,
    pub memory_usage: u64,
    pub index_count_by_collection: BTreeMap<String, usize>,
}

impl HealthSnapshot {
    /// A snapshot with no query activity, built from probe figures alone.
    pub fn idle(figures: SystemFigures, timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            connection_count: figures.connection_count,
            query_count: 0,
            average_query_time: 0.0,
            slow_query_count: 0,
            cache_hit_rate: figures.cache_hit_rate,
            memory_usage: figures.memory_usage,
            index_count_by_collection: figures.index_count_by_collection,
        }
    }
}

// == Collection Performance ==
/// Per-collection latency aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionPerformance {
    pub count: usize,
    pub avg_time: f64,
    pub max_time: f64,
}

impl CollectionPerformance {
    pub(crate) fn add(&mut self, duration_ms: f64) {
        let total = self.avg_time * self.count as f64 + duration_ms;
        self.count += 1;
        self.avg_time = total / self.count as f64;
        self.max_time = self.max_time.max(duration_ms);
    }
}

// == Health Report ==
/// Payload served to the operational health endpoint.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub healthy: bool,
    pub metrics: Option<HealthSnapshot>,
    pub recommendations: Vec<String>,
    pub uptime_seconds: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collection_performance_running_mean() {
        let mut perf = CollectionPerformance::default();
        perf.add(10.0);
        perf.add(30.0);
        perf.add(20.0);

        assert_eq!(perf.count, 3);
        assert!((perf.avg_time - 20.0).abs() < 1e-9);
        assert_eq!(perf.max_time, 30.0);
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let snapshot = HealthSnapshot::idle(SystemFigures::default(), Utc::now());
        let json = serde_json::to_value(&snapshot).unwrap();

        assert!(json.get("averageQueryTime").is_some());
        assert!(json.get("indexCountByCollection").is_some());
        assert!(json.get("cacheHitRate").is_some());
    }
}
