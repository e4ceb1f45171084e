//! Discovery Cache - TTL cache and query monitor for a social discovery backend
//!
//! Provides a Redis-like command surface over an in-process TTL store, key
//! namespaces with pattern invalidation, and query latency monitoring with
//! periodic health snapshots.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod monitor;
pub mod tasks;

pub use api::AppState;
pub use config::Config;
pub use error::{CacheError, MonitorError};
pub use tasks::{spawn_cleanup_task, MonitorRunner};
