//! Monitoring Tasks
//!
//! The three independent monitor timers: snapshot collection, slow-query
//! reporting and history cleanup.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::monitor::{gather_figures, SharedMonitor, SystemProbe};

// == Intervals ==
#[derive(Debug, Clone)]
pub struct MonitorIntervals {
    pub snapshot: Duration,
    pub slow_query_report: Duration,
    pub history_cleanup: Duration,
}

impl Default for MonitorIntervals {
    fn default() -> Self {
        Self {
            snapshot: Duration::from_secs(30),
            slow_query_report: Duration::from_secs(300),
            history_cleanup: Duration::from_secs(3600),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Stopped,
    Running,
}

// == Monitor Runner ==
/// Owns the monitor timers.
///
/// Each timer is its own task. An error or a panic inside one tick is logged
/// and the timer keeps its schedule.
pub struct MonitorRunner {
    monitor: SharedMonitor,
    probe: Arc<dyn SystemProbe>,
    intervals: MonitorIntervals,
    handles: Vec<JoinHandle<()>>,
}

impl MonitorRunner {
    pub fn new(monitor: SharedMonitor, probe: Arc<dyn SystemProbe>, intervals: MonitorIntervals) -> Self {
        Self {
            monitor,
            probe,
            intervals,
            handles: Vec::new(),
        }
    }

    pub fn state(&self) -> MonitorState {
        if self.handles.is_empty() {
            MonitorState::Stopped
        } else {
            MonitorState::Running
        }
    }

    /// Arms all three timers. Returns false if already running.
    pub fn start_monitoring(&mut self) -> bool {
        if self.state() == MonitorState::Running {
            return false;
        }

        self.handles = vec![
            spawn_snapshot_task(self.monitor.clone(), self.probe.clone(), self.intervals.snapshot),
            spawn_slow_query_report_task(self.monitor.clone(), self.intervals.slow_query_report),
            spawn_history_cleanup_task(self.monitor.clone(), self.intervals.history_cleanup),
        ];
        info!("Query monitoring started");
        true
    }

    /// Cancels every timer.
    pub fn stop(&mut self) {
        if self.handles.is_empty() {
            return;
        }
        for handle in self.handles.drain(..) {
            handle.abort();
        }
        info!("Query monitoring stopped");
    }

    pub fn handles(&self) -> &[JoinHandle<()>] {
        &self.handles
    }
}

impl Drop for MonitorRunner {
    fn drop(&mut self) {
        self.stop();
    }
}

// == Timers ==
/// Runs one tick, logging a panic instead of letting it end the timer task.
async fn guarded_tick<F: Future<Output = ()>>(timer: &str, tick: F) {
    if let Err(payload) = AssertUnwindSafe(tick).catch_unwind().await {
        error!("Monitor {} tick panicked: {}", timer, panic_message(payload.as_ref()));
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.as_str()
    } else {
        "non-string panic payload"
    }
}

/// Collects a snapshot immediately and then once per period.
fn spawn_snapshot_task(
    monitor: SharedMonitor,
    probe: Arc<dyn SystemProbe>,
    period: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            guarded_tick("snapshot", collect_snapshot(&monitor, probe.as_ref())).await;
        }
    })
}

async fn collect_snapshot(monitor: &SharedMonitor, probe: &dyn SystemProbe) {
    let figures = match gather_figures(probe).await {
        Ok(figures) => figures,
        Err(e) => {
            error!("Health snapshot skipped: {}", e);
            return;
        }
    };

    let mut guard = monitor.write().await;
    let snapshot = guard.collect_snapshot(figures);
    if guard.is_healthy() {
        debug!(
            "Health snapshot: {} queries, avg {:.1}ms, hit rate {:.2}",
            snapshot.query_count, snapshot.average_query_time, snapshot.cache_hit_rate
        );
    } else {
        warn!("Health check failing: {}", guard.recommendations().join("; "));
    }
}

/// Logs the slow queries seen since the previous report.
fn spawn_slow_query_report_task(monitor: SharedMonitor, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut last_report = Utc::now();

        loop {
            ticker.tick().await;
            let since = last_report;
            last_report = Utc::now();
            guarded_tick("slow-query report", report_slow_queries(&monitor, since)).await;
        }
    })
}

async fn report_slow_queries(monitor: &SharedMonitor, since: DateTime<Utc>) {
    let slow = monitor.read().await.slow_queries_since(since);
    if slow.is_empty() {
        debug!("No slow queries since last report");
        return;
    }

    warn!("{} slow queries since last report", slow.len());
    for sample in slow.iter().take(10) {
        warn!(
            "  {} on {} ({}): {:.1}ms at {}",
            sample.operation_name,
            sample.collection,
            sample.operation,
            sample.duration_ms,
            sample.timestamp.to_rfc3339()
        );
    }
}

/// Discards snapshots and samples older than the retention window.
fn spawn_history_cleanup_task(monitor: SharedMonitor, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            guarded_tick("history cleanup", async {
                let removed = monitor.write().await.prune_history(Utc::now());
                if removed > 0 {
                    info!("Monitor cleanup: removed {} old snapshots", removed);
                }
            })
            .await;
        }
    })
}
