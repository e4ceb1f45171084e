//! Health Rules Module
//!
//! Threshold checks over a [`HealthSnapshot`] and the advice attached to
//! each violated threshold.

use crate::monitor::HealthSnapshot;

// == Thresholds ==
/// Limits a snapshot must stay within to be considered healthy.
#[derive(Debug, Clone, PartialEq)]
pub struct HealthThresholds {
    /// Healthy while `connection_count <= max_connections`
    pub max_connections: usize,
    /// Healthy while `cache_hit_rate >= min_cache_hit_rate`
    pub min_cache_hit_rate: f64,
    /// Healthy while `average_query_time <= max_average_query_ms`
    pub max_average_query_ms: f64,
}

impl Default for HealthThresholds {
    fn default() -> Self {
        Self {
            max_connections: 100,
            min_cache_hit_rate: 0.8,
            max_average_query_ms: 100.0,
        }
    }
}

// == Findings ==
/// A single observation about a snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum Finding {
    TooManyConnections(usize),
    LowCacheHitRate(f64),
    SlowAverageQuery(f64),
    SlowQueriesPresent(usize),
}

impl Finding {
    /// Whether this finding makes the snapshot unhealthy.
    ///
    /// Slow queries alone are advisory.
    pub fn is_violation(&self) -> bool {
        !matches!(self, Finding::SlowQueriesPresent(_))
    }

    pub fn recommendation(&self) -> String {
        match self {
            Finding::TooManyConnections(n) => format!(
                "High connection count ({}): use connection pooling and release idle connections",
                n
            ),
            Finding::LowCacheHitRate(rate) => format!(
                "Low cache hit rate ({:.1}%): lengthen TTLs for stable data or add caching to hot read paths",
                rate * 100.0
            ),
            Finding::SlowAverageQuery(ms) => format!(
                "High average query time ({:.1}ms): add indexes for frequently filtered and sorted fields",
                ms
            ),
            Finding::SlowQueriesPresent(n) => format!(
                "{} slow queries detected: review and optimize the slowest operations",
                n
            ),
        }
    }
}

impl HealthThresholds {
    /// Every finding for the snapshot, in a fixed order.
    pub fn findings(&self, snapshot: &HealthSnapshot) -> Vec<Finding> {
        let mut findings = Vec::new();
        if snapshot.connection_count > self.max_connections {
            findings.push(Finding::TooManyConnections(snapshot.connection_count));
        }
        if snapshot.cache_hit_rate < self.min_cache_hit_rate {
            findings.push(Finding::LowCacheHitRate(snapshot.cache_hit_rate));
        }
        if snapshot.average_query_time > self.max_average_query_ms {
            findings.push(Finding::SlowAverageQuery(snapshot.average_query_time));
        }
        if snapshot.slow_query_count > 0 {
            findings.push(Finding::SlowQueriesPresent(snapshot.slow_query_count));
        }
        findings
    }

    pub fn is_healthy(&self, snapshot: &HealthSnapshot) -> bool {
        !self.findings(snapshot).iter().any(Finding::is_violation)
    }

    pub fn recommendations(&self, snapshot: &HealthSnapshot) -> Vec<String> {
        self.findings(snapshot)
            .iter()
            .map(Finding::recommendation)
            .collect()
    }
}
