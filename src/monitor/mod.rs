//! Monitor Module
//!
//! Query performance monitoring: latency sampling, periodic health
//! snapshots, the health verdict and recommendations.

mod health;
mod indexes;
mod probe;
mod query_monitor;
mod sample;

pub use health::{Finding, HealthThresholds};
pub use indexes::{default_index_registry, IndexRegistry, IndexSpec};
pub use probe::{gather_figures, ConnectionGauge, ConnectionGuard, LocalProbe, SystemProbe};
pub use query_monitor::{time_operation, MonitorSettings, QueryMonitor, SharedMonitor};
pub use sample::{CollectionPerformance, HealthReport, HealthSnapshot, LatencySample, SystemFigures};
