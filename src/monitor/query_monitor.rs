//! Query Monitor Module
//!
//! Rolling buffer of latency samples, snapshot history and the health
//! verdict derived from the latest snapshot.

use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use tokio::sync::RwLock;
use tracing::warn;

use crate::monitor::{
    CollectionPerformance, HealthReport, HealthSnapshot, HealthThresholds, LatencySample,
    SystemFigures,
};

/// Monitor shared between call sites and the monitoring timers.
pub type SharedMonitor = Arc<RwLock<QueryMonitor>>;

// == Settings ==
#[derive(Debug, Clone)]
pub struct MonitorSettings {
    /// Samples at or above this duration are slow
    pub slow_query_threshold_ms: f64,
    /// Sample buffer capacity
    pub max_samples: usize,
    /// Snapshot history capacity
    pub max_snapshots: usize,
    /// Number of most recent samples averaged into a snapshot
    pub average_window: usize,
    /// Samples and snapshots older than this are discarded
    pub retention: ChronoDuration,
    pub thresholds: HealthThresholds,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            slow_query_threshold_ms: 1000.0,
            max_samples: 1000,
            max_snapshots: 100,
            average_window: 100,
            retention: ChronoDuration::hours(24),
            thresholds: HealthThresholds::default(),
        }
    }
}

// == Query Monitor ==
#[derive(Debug)]
pub struct QueryMonitor {
    settings: MonitorSettings,
    samples: VecDeque<LatencySample>,
    history: VecDeque<HealthSnapshot>,
}

impl QueryMonitor {
    // == Constructor ==
    pub fn new(settings: MonitorSettings) -> Self {
        Self {
            settings,
            samples: VecDeque::new(),
            history: VecDeque::new(),
        }
    }

    pub fn shared(self) -> SharedMonitor {
        Arc::new(RwLock::new(self))
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    // == Log Query ==
    /// Records one timed operation. Returns true if it was slow, in which
    /// case a warning is logged immediately.
    pub fn log_query(
        &mut self,
        name: &str,
        duration_ms: f64,
        collection: &str,
        operation: &str,
    ) -> bool {
        self.record_sample(LatencySample {
            operation_name: name.to_string(),
            collection: collection.to_string(),
            operation: operation.to_string(),
            duration_ms,
            timestamp: Utc::now(),
        })
    }

    /// Appends a sample with its own timestamp, trimming the buffer to its
    /// capacity and retention window.
    pub fn record_sample(&mut self, sample: LatencySample) -> bool {
        let slow = self.is_slow(sample.duration_ms);
        if slow {
            warn!(
                "Slow query: {} on {} ({}) took {:.1}ms",
                sample.operation_name, sample.collection, sample.operation, sample.duration_ms
            );
        }

        let cutoff = sample.timestamp - self.settings.retention;
        self.samples.push_back(sample);
        while self.samples.len() > self.settings.max_samples {
            self.samples.pop_front();
        }
        while self
            .samples
            .front()
            .is_some_and(|oldest| oldest.timestamp < cutoff)
        {
            self.samples.pop_front();
        }
        slow
    }

    pub fn is_slow(&self, duration_ms: f64) -> bool {
        duration_ms >= self.settings.slow_query_threshold_ms
    }

    pub fn sample_count(&self) -> usize {
        self.samples.len()
    }

    // == Snapshots ==
    /// Aggregates the current buffer with the probe figures.
    pub fn build_snapshot(&self, figures: SystemFigures, now: DateTime<Utc>) -> HealthSnapshot {
        let window = self.settings.average_window.max(1);
        let recent: Vec<&LatencySample> = self.samples.iter().rev().take(window).collect();

        let mut snapshot = HealthSnapshot::idle(figures, now);
        snapshot.query_count = self.samples.len();
        if !recent.is_empty() {
            let total: f64 = recent.iter().map(|s| s.duration_ms).sum();
            snapshot.average_query_time = total / recent.len() as f64;
            snapshot.slow_query_count = recent.iter().filter(|s| self.is_slow(s.duration_ms)).count();
        }
        snapshot
    }

    /// Builds a snapshot now and appends it to the history.
    pub fn collect_snapshot(&mut self, figures: SystemFigures) -> HealthSnapshot {
        let snapshot = self.build_snapshot(figures, Utc::now());
        self.record_snapshot(snapshot.clone());
        snapshot
    }

    pub fn record_snapshot(&mut self, snapshot: HealthSnapshot) {
        self.history.push_back(snapshot);
        while self.history.len() > self.settings.max_snapshots {
            self.history.pop_front();
        }
    }

    pub fn latest_snapshot(&self) -> Option<&HealthSnapshot> {
        self.history.back()
    }

    /// Snapshot history, oldest first.
    pub fn history(&self) -> Vec<HealthSnapshot> {
        self.history.iter().cloned().collect()
    }

    // == Retention ==
    /// Drops snapshots and samples older than the retention window.
    /// Returns the number of snapshots removed.
    pub fn prune_history(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.settings.retention;
        let before = self.history.len();
        self.history.retain(|snapshot| snapshot.timestamp >= cutoff);
        self.samples.retain(|sample| sample.timestamp >= cutoff);
        before - self.history.len()
    }

    // == Health ==
    /// Verdict for the latest snapshot. False until a snapshot exists.
    pub fn is_healthy(&self) -> bool {
        self.latest_snapshot()
            .is_some_and(|snapshot| self.settings.thresholds.is_healthy(snapshot))
    }

    /// One suggestion per finding on the latest snapshot.
    pub fn recommendations(&self) -> Vec<String> {
        self.latest_snapshot()
            .map(|snapshot| self.settings.thresholds.recommendations(snapshot))
            .unwrap_or_default()
    }

    pub fn health_report(&self, uptime_seconds: u64) -> HealthReport {
        HealthReport {
            healthy: self.is_healthy(),
            metrics: self.latest_snapshot().cloned(),
            recommendations: self.recommendations(),
            uptime_seconds,
        }
    }

    // == Query Views ==
    /// The `limit` slowest flagged samples, longest first.
    pub fn slow_queries(&self, limit: usize) -> Vec<LatencySample> {
        let mut slow: Vec<LatencySample> = self
            .samples
            .iter()
            .filter(|s| self.is_slow(s.duration_ms))
            .cloned()
            .collect();
        slow.sort_by(|a, b| b.duration_ms.total_cmp(&a.duration_ms));
        slow.truncate(limit);
        slow
    }

    /// Slow samples recorded after `since`, oldest first.
    pub fn slow_queries_since(&self, since: DateTime<Utc>) -> Vec<LatencySample> {
        self.samples
            .iter()
            .filter(|s| s.timestamp > since && self.is_slow(s.duration_ms))
            .cloned()
            .collect()
    }

    pub fn performance_by_collection(&self) -> BTreeMap<String, CollectionPerformance> {
        let mut by_collection: BTreeMap<String, CollectionPerformance> = BTreeMap::new();
        for sample in &self.samples {
            by_collection
                .entry(sample.collection.clone())
                .or_default()
                .add(sample.duration_ms);
        }
        by_collection
    }
}

// == Timing Helper ==
/// Awaits `operation` and logs its wall-clock duration to the monitor.
pub async fn time_operation<F: Future>(
    monitor: &SharedMonitor,
    name: &str,
    collection: &str,
    operation: &str,
    fut: F,
) -> F::Output {
    let started = Instant::now();
    let output = fut.await;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    monitor
        .write()
        .await
        .log_query(name, elapsed_ms, collection, operation);
    output
}
