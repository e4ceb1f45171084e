//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - TTL Sweep: Removes expired cache entries at configured intervals
//! - Monitoring: Snapshot collection, slow-query reports, history cleanup

mod cleanup;
mod monitoring;

pub use cleanup::spawn_cleanup_task;
pub use monitoring::{MonitorIntervals, MonitorRunner, MonitorState};
