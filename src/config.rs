//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::monitor::MonitorSettings;
use crate::tasks::MonitorIntervals;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// TTL in seconds for counters created without an explicit TTL
    pub default_ttl: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background TTL sweep interval in seconds
    pub sweep_interval: u64,
    /// Health snapshot interval in seconds
    pub snapshot_interval: u64,
    /// Slow-query report interval in seconds
    pub slow_query_report_interval: u64,
    /// Monitor history cleanup interval in seconds
    pub history_cleanup_interval: u64,
    /// Operations at or above this many milliseconds are slow
    pub slow_query_threshold_ms: f64,
    /// Latency sample buffer capacity
    pub max_samples: usize,
    /// Health snapshot history capacity
    pub max_snapshots: usize,
    /// Number of recent samples averaged per snapshot
    pub average_window: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEFAULT_TTL` - Counter TTL in seconds (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - TTL sweep frequency in seconds (default: 60)
    /// - `SNAPSHOT_INTERVAL` - Health snapshot frequency in seconds (default: 30)
    /// - `SLOW_QUERY_REPORT_INTERVAL` - Slow-query report frequency in seconds (default: 300)
    /// - `HISTORY_CLEANUP_INTERVAL` - History cleanup frequency in seconds (default: 3600)
    /// - `SLOW_QUERY_THRESHOLD_MS` - Slow-query threshold (default: 1000)
    /// - `MAX_SAMPLES` - Sample buffer size (default: 1000)
    /// - `MAX_SNAPSHOTS` - Snapshot history size (default: 100)
    /// - `AVERAGE_WINDOW` - Samples per average (default: 100)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_ttl: positive_var("DEFAULT_TTL", defaults.default_ttl),
            server_port: var_or("SERVER_PORT", defaults.server_port),
            sweep_interval: positive_var("SWEEP_INTERVAL", defaults.sweep_interval),
            snapshot_interval: positive_var("SNAPSHOT_INTERVAL", defaults.snapshot_interval),
            slow_query_report_interval: positive_var(
                "SLOW_QUERY_REPORT_INTERVAL",
                defaults.slow_query_report_interval,
            ),
            history_cleanup_interval: positive_var(
                "HISTORY_CLEANUP_INTERVAL",
                defaults.history_cleanup_interval,
            ),
            slow_query_threshold_ms: positive_millis(
                "SLOW_QUERY_THRESHOLD_MS",
                defaults.slow_query_threshold_ms,
            ),
            max_samples: positive_var("MAX_SAMPLES", defaults.max_samples),
            max_snapshots: positive_var("MAX_SNAPSHOTS", defaults.max_snapshots),
            average_window: positive_var("AVERAGE_WINDOW", defaults.average_window),
        }
    }

    pub fn monitor_settings(&self) -> MonitorSettings {
        MonitorSettings {
            slow_query_threshold_ms: self.slow_query_threshold_ms,
            max_samples: self.max_samples,
            max_snapshots: self.max_snapshots,
            average_window: self.average_window,
            ..MonitorSettings::default()
        }
    }

    pub fn monitor_intervals(&self) -> MonitorIntervals {
        MonitorIntervals {
            snapshot: Duration::from_secs(self.snapshot_interval),
            slow_query_report: Duration::from_secs(self.slow_query_report_interval),
            history_cleanup: Duration::from_secs(self.history_cleanup_interval),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_ttl: 300,
            server_port: 3000,
            sweep_interval: 60,
            snapshot_interval: 30,
            slow_query_report_interval: 300,
            history_cleanup_interval: 3600,
            slow_query_threshold_ms: 1000.0,
            max_samples: 1000,
            max_snapshots: 100,
            average_window: 100,
        }
    }
}

fn var_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Like `var_or`, but zero falls back to the default.
fn positive_var<T: FromStr + Default + PartialEq>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .filter(|v: &T| *v != T::default())
        .unwrap_or(default)
}

/// A finite, strictly positive duration in milliseconds. Zero, negative,
/// `NaN` and infinite values fall back to the default.
fn positive_millis(name: &str, default: f64) -> f64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v > 0.0)
        .unwrap_or(default)
}
