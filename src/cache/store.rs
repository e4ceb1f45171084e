//! Cache Store Module
//!
//! The TTL store: a HashMap of entries with lazy eviction on read and a
//! sweep entry point for the background cleanup task.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::RwLock;

use crate::cache::{CacheEntry, CacheStats, KeyPattern, MAX_KEY_LENGTH};
use crate::error::{CacheError, Result};

/// Store shared between request handlers and background tasks.
///
/// Every operation takes the lock for its whole duration, so single-key
/// operations and `increment` are serialized per store.
pub type SharedStore = Arc<RwLock<CacheStore>>;

// == Cache Store ==
/// Content-agnostic key-value storage with expiration.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Lookup statistics
    stats: CacheStats,
    /// TTL in seconds for counters created by `increment` without a TTL
    default_ttl: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store.
    ///
    /// # Arguments
    /// * `default_ttl` - TTL in seconds given to counters that `increment`
    ///   creates without an explicit TTL
    pub fn new(default_ttl: u64) -> Self {
        Self {
            entries: HashMap::new(),
            stats: CacheStats::default(),
            default_ttl: default_ttl.max(1),
        }
    }

    /// Wraps the store for sharing across tasks.
    pub fn shared(self) -> SharedStore {
        Arc::new(RwLock::new(self))
    }

    // == Set ==
    /// Stores a value, unconditionally replacing any existing entry.
    pub fn set(&mut self, key: impl Into<String>, value: Value, ttl_seconds: u64) -> Result<()> {
        let key = key.into();
        validate_key(&key)?;
        validate_ttl(ttl_seconds)?;

        self.entries.insert(key, CacheEntry::new(value, ttl_seconds));
        self.stats.set_total_entries(self.entries.len());
        Ok(())
    }

    // == Get ==
    /// Retrieves a live value.
    ///
    /// An expired entry is removed on the spot and reported as a miss.
    pub fn get(&mut self, key: &str) -> Option<Value> {
        let value = self.live_entry(key).map(|entry| entry.value.clone());
        self.stats.record_lookup(value.is_some());
        value
    }

    /// Like `get`, but also returns the remaining TTL in seconds, read from
    /// the same entry.
    pub fn get_with_ttl(&mut self, key: &str) -> Option<(Value, u64)> {
        let found = self
            .live_entry(key)
            .map(|entry| (entry.value.clone(), entry.ttl_remaining()));
        self.stats.record_lookup(found.is_some());
        found
    }

    // == Delete ==
    /// Removes an entry. Returns 1 if something was removed, else 0.
    pub fn delete(&mut self, key: &str) -> usize {
        let removed = usize::from(self.entries.remove(key).is_some());
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Exists ==
    /// True if the key holds a live entry. Applies lazy eviction like `get`
    /// but does not count as a lookup.
    pub fn exists(&mut self, key: &str) -> bool {
        self.live_entry(key).is_some()
    }

    // == Batch Get ==
    /// Looks up each key independently; the result is aligned with `keys`.
    pub fn batch_get<S: AsRef<str>>(&mut self, keys: &[S]) -> Vec<Option<Value>> {
        keys.iter().map(|key| self.get(key.as_ref())).collect()
    }

    // == Batch Set ==
    /// Stores every pair with the same TTL.
    ///
    /// The TTL is checked up front. Each write is atomic; the batch is not, so
    /// an invalid key part-way through leaves the earlier pairs written.
    pub fn batch_set<K: Into<String>>(
        &mut self,
        pairs: impl IntoIterator<Item = (K, Value)>,
        ttl_seconds: u64,
    ) -> Result<()> {
        validate_ttl(ttl_seconds)?;
        for (key, value) in pairs {
            self.set(key, value, ttl_seconds)?;
        }
        Ok(())
    }

    // == Increment ==
    /// Adds 1 to an integer counter and returns the new value.
    ///
    /// An absent or expired key counts as 0. With `ttl_seconds` the expiry is
    /// reset; without it an existing counter keeps its expiry and a new one
    /// gets the store's default TTL.
    pub fn increment(&mut self, key: &str, ttl_seconds: Option<u64>) -> Result<i64> {
        validate_key(key)?;
        if let Some(ttl) = ttl_seconds {
            validate_ttl(ttl)?;
        }

        let default_ttl = self.default_ttl;
        let next = match self.live_entry_mut(key) {
            Some(entry) => {
                let current = counter_value(key, &entry.value)?;
                let next = current.checked_add(1).ok_or_else(|| {
                    CacheError::InvalidArgument(format!("Counter '{}' would overflow", key))
                })?;
                entry.value = Value::from(next);
                if let Some(ttl) = ttl_seconds {
                    entry.expire_in(ttl);
                }
                next
            }
            None => {
                let ttl = ttl_seconds.unwrap_or(default_ttl);
                self.entries
                    .insert(key.to_string(), CacheEntry::new(Value::from(1), ttl));
                1
            }
        };

        self.stats.set_total_entries(self.entries.len());
        Ok(next)
    }

    // == Expire ==
    /// Resets the expiry of a live entry. Returns false if the key is absent
    /// or already expired.
    pub fn expire(&mut self, key: &str, ttl_seconds: u64) -> Result<bool> {
        validate_ttl(ttl_seconds)?;
        Ok(match self.live_entry_mut(key) {
            Some(entry) => {
                entry.expire_in(ttl_seconds);
                true
            }
            None => false,
        })
    }

    // == TTL ==
    /// Remaining whole seconds of a live entry.
    pub fn ttl(&mut self, key: &str) -> Option<u64> {
        self.live_entry(key).map(CacheEntry::ttl_remaining)
    }

    // == Keys Matching ==
    /// Lists live keys matching a wildcard pattern, sorted.
    pub fn keys_matching(&self, pattern: &str) -> Result<Vec<String>> {
        let pattern = KeyPattern::compile(pattern)?;
        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|(key, entry)| !entry.is_expired() && pattern.matches(key))
            .map(|(key, _)| key.clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    // == Delete Pattern ==
    /// Removes every entry whose key matches the pattern.
    pub fn delete_pattern(&mut self, pattern: &str) -> Result<usize> {
        let pattern = KeyPattern::compile(pattern)?;
        Ok(self.delete_compiled(&pattern))
    }

    /// Removes every entry matching an already compiled pattern.
    pub fn delete_compiled(&mut self, pattern: &KeyPattern) -> usize {
        let before = self.entries.len();
        if pattern.is_literal() {
            self.entries.remove(pattern.as_str());
        } else {
            self.entries.retain(|key, _| !pattern.matches(key));
        }
        self.stats.set_total_entries(self.entries.len());
        before - self.entries.len()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.entries.len());
        stats
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let removed = before - self.entries.len();

        self.stats.record_expirations(removed);
        self.stats.set_total_entries(self.entries.len());
        removed
    }

    // == Memory ==
    /// Approximate payload size: key bytes plus serialized value bytes.
    pub fn approx_memory_bytes(&self) -> usize {
        self.entries
            .iter()
            .map(|(key, entry)| key.len() + entry.value.to_string().len())
            .sum()
    }

    // == Length ==
    /// Number of stored entries, including expired ones not yet evicted.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn default_ttl(&self) -> u64 {
        self.default_ttl
    }

    fn live_entry(&mut self, key: &str) -> Option<&CacheEntry> {
        self.live_entry_mut(key).map(|entry| &*entry)
    }

    fn live_entry_mut(&mut self, key: &str) -> Option<&mut CacheEntry> {
        let expired = self.entries.get(key)?.is_expired();
        if expired {
            self.entries.remove(key);
            self.stats.record_expirations(1);
            self.stats.set_total_entries(self.entries.len());
            return None;
        }
        self.entries.get_mut(key)
    }
}

// == Validation ==
fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidArgument("Key cannot be empty".to_string()));
    }
    if key.len() > MAX_KEY_LENGTH {
        return Err(CacheError::InvalidArgument(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        )));
    }
    Ok(())
}

fn validate_ttl(ttl_seconds: u64) -> Result<()> {
    if ttl_seconds == 0 {
        return Err(CacheError::InvalidArgument(
            "TTL must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

fn counter_value(key: &str, value: &Value) -> Result<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        CacheError::InvalidArgument(format!("Value at '{}' is not an integer", key))
    })
}
