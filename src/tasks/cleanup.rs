//! TTL Sweep Task
//!
//! Background task that periodically removes expired cache entries,
//! whether or not anything ever reads them again.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// The sweep runs under the store's write lock, so it never interleaves with
/// a request-driven operation; a key already evicted lazily is simply not
/// there to remove.
///
/// # Arguments
/// * `cache` - Shared reference to the store
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during shutdown.
pub fn spawn_cleanup_task(cache: SharedStore, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL sweep task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let (removed, remaining) = {
                let mut cache_guard = cache.write().await;
                let removed = cache_guard.cleanup_expired();
                (removed, cache_guard.len())
            };

            if removed > 0 {
                info!(
                    "TTL sweep: removed {} expired entries, {} remain",
                    removed, remaining
                );
            } else {
                debug!("TTL sweep: no expired entries found");
            }
        }
    })
}
