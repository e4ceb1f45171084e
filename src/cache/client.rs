//! Cache Client Module
//!
//! The command surface call sites are written against, its in-process
//! implementation, typed JSON helpers and the `memoize` combinator.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::cache::{SharedStore, MAX_VALUE_SIZE};
use crate::error::{CacheError, Result};
use crate::monitor::{time_operation, SharedMonitor};

// == Cache Client Trait ==
/// Remote-cache style command vocabulary.
///
/// Values cross this boundary as serialized JSON text. Only invalid
/// arguments surface as errors; internal failures degrade to a miss.
#[async_trait]
pub trait CacheClient: Send + Sync {
    /// Serialized value, or `None` on miss.
    async fn get(&self, key: &str) -> Option<String>;

    /// Stores `value` (JSON text) for `ttl_seconds`. Returns `"OK"`.
    async fn setex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<&'static str>;

    /// 1 if the key was removed, else 0.
    async fn del(&self, key: &str) -> u64;

    /// 1 if the key holds a live value, else 0.
    async fn exists(&self, key: &str) -> u64;

    /// One slot per key, `None` per miss.
    async fn mget(&self, keys: &[String]) -> Vec<Option<String>>;

    /// Increments an integer counter and returns the new value.
    async fn incr(&self, key: &str) -> Result<i64>;

    /// 1 if the expiry was updated, 0 if the key is absent or expired.
    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<u64>;

    /// Live keys matching a `*` wildcard pattern.
    async fn keys(&self, pattern: &str) -> Result<Vec<String>>;

    /// Human-readable status text. Always includes the entry count.
    async fn info(&self, section: Option<&str>) -> String;

    async fn ping(&self) -> String {
        "PONG".to_string()
    }
}

// == In-Process Cache ==
/// [`CacheClient`] backed by the in-process TTL store.
#[derive(Debug, Clone)]
pub struct InProcessCache {
    store: SharedStore,
}

impl InProcessCache {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }
}

/// Renders a stored value as JSON text.
///
/// Stored values are `serde_json::Value`s, whose map keys are strings and
/// whose numbers are finite, so rendering cannot fail. Typed decoding at the
/// boundary is where fail-open applies; see [`get_json`].
fn encode(value: &Value) -> String {
    value.to_string()
}

#[async_trait]
impl CacheClient for InProcessCache {
    async fn get(&self, key: &str) -> Option<String> {
        self.store.write().await.get(key).as_ref().map(encode)
    }

    async fn setex(&self, key: &str, ttl_seconds: u64, value: &str) -> Result<&'static str> {
        if value.len() > MAX_VALUE_SIZE {
            return Err(CacheError::InvalidArgument(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            )));
        }
        let parsed: Value = serde_json::from_str(value).map_err(|e| {
            CacheError::InvalidArgument(format!("Value for '{}' is not valid JSON: {}", key, e))
        })?;

        self.store.write().await.set(key, parsed, ttl_seconds)?;
        Ok("OK")
    }

    async fn del(&self, key: &str) -> u64 {
        self.store.write().await.delete(key) as u64
    }

    async fn exists(&self, key: &str) -> u64 {
        u64::from(self.store.write().await.exists(key))
    }

    async fn mget(&self, keys: &[String]) -> Vec<Option<String>> {
        self.store
            .write()
            .await
            .batch_get(keys)
            .iter()
            .map(|value| value.as_ref().map(encode))
            .collect()
    }

    async fn incr(&self, key: &str) -> Result<i64> {
        self.store.write().await.increment(key, None)
    }

    async fn expire(&self, key: &str, ttl_seconds: u64) -> Result<u64> {
        let updated = self.store.write().await.expire(key, ttl_seconds)?;
        Ok(u64::from(updated))
    }

    async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        self.store.read().await.keys_matching(pattern)
    }

    async fn info(&self, section: Option<&str>) -> String {
        let store = self.store.read().await;
        let stats = store.stats();

        let server = format!(
            "# Server\r\nengine:in-process\r\ndefault_ttl:{}",
            store.default_ttl()
        );
        let stats_block = format!(
            "# Stats\r\nkeyspace_hits:{}\r\nkeyspace_misses:{}\r\nexpired_keys:{}\r\nhit_rate:{:.4}",
            stats.hits,
            stats.misses,
            stats.expirations,
            stats.hit_rate()
        );
        let memory = format!("# Memory\r\nused_memory:{}", store.approx_memory_bytes());
        let keyspace = format!("# Keyspace\r\nkeys:{}", stats.total_entries);

        let blocks = match section.map(str::to_ascii_lowercase).as_deref() {
            None | Some("all") | Some("default") | Some("everything") => {
                vec![server, stats_block, memory, keyspace]
            }
            Some("server") => vec![server, keyspace],
            Some("stats") => vec![stats_block, keyspace],
            Some("memory") => vec![memory, keyspace],
            Some(_) => vec![keyspace],
        };
        blocks.join("\r\n")
    }
}

// == Typed Helpers ==
/// Reads and deserializes a cached value.
///
/// A value that does not deserialize into `T` is logged and treated as a miss.
pub async fn get_json<T: DeserializeOwned>(client: &dyn CacheClient, key: &str) -> Option<T> {
    let raw = client.get(key).await?;
    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!("Cached value at '{}' failed to deserialize: {}", key, e);
            None
        }
    }
}

/// Serializes and stores a value. Returns false if serialization failed.
pub async fn set_json<T: Serialize + ?Sized>(
    client: &dyn CacheClient,
    key: &str,
    ttl_seconds: u64,
    value: &T,
) -> Result<bool> {
    let text = match serde_json::to_string(value) {
        Ok(text) => text,
        Err(e) => {
            warn!("Value for '{}' failed to serialize, not cached: {}", key, e);
            return Ok(false);
        }
    };
    client.setex(key, ttl_seconds, &text).await?;
    Ok(true)
}

// == Memoize ==
/// Cache-aside wrapper around an async computation.
///
/// Built with [`memoize`]. A call derives the key from its argument, returns
/// the cached value on hit, and otherwise runs the computation and stores a
/// successful result.
pub struct Memoized<KF, F> {
    client: Arc<dyn CacheClient>,
    ttl_seconds: u64,
    key_fn: KF,
    compute: F,
    monitor: Option<MissTiming>,
}

struct MissTiming {
    monitor: SharedMonitor,
    name: String,
    collection: String,
}

/// Wraps `compute` with cache-get / compute / cache-set.
///
/// Returns `InvalidArgument` for a zero TTL.
pub fn memoize<KF, F>(
    client: Arc<dyn CacheClient>,
    ttl_seconds: impl Into<u64>,
    key_fn: KF,
    compute: F,
) -> Result<Memoized<KF, F>> {
    let ttl_seconds = ttl_seconds.into();
    if ttl_seconds == 0 {
        return Err(CacheError::InvalidArgument(
            "TTL must be a positive number of seconds".to_string(),
        ));
    }
    Ok(Memoized {
        client,
        ttl_seconds,
        key_fn,
        compute,
        monitor: None,
    })
}

impl<KF, F> Memoized<KF, F> {
    /// Records each miss-path computation as a query sample.
    pub fn with_monitor(
        mut self,
        monitor: SharedMonitor,
        name: impl Into<String>,
        collection: impl Into<String>,
    ) -> Self {
        self.monitor = Some(MissTiming {
            monitor,
            name: name.into(),
            collection: collection.into(),
        });
        self
    }

    pub async fn call<A, T, E, Fut>(&self, args: A) -> std::result::Result<T, E>
    where
        KF: Fn(&A) -> String,
        F: Fn(A) -> Fut,
        Fut: Future<Output = std::result::Result<T, E>>,
        T: Serialize + DeserializeOwned,
    {
        let key = (self.key_fn)(&args);
        if let Some(hit) = get_json::<T>(self.client.as_ref(), &key).await {
            return Ok(hit);
        }

        let fresh = match &self.monitor {
            Some(timing) => {
                time_operation(
                    &timing.monitor,
                    &timing.name,
                    &timing.collection,
                    "find",
                    (self.compute)(args),
                )
                .await?
            }
            None => (self.compute)(args).await?,
        };

        if let Err(e) = set_json(self.client.as_ref(), &key, self.ttl_seconds, &fresh).await {
            warn!("Memoized result for '{}' not cached: {}", key, e);
        }
        Ok(fresh)
    }
}
