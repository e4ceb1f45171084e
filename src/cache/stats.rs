//! Cache Statistics Module
//!
//! Lookup outcomes and expirations, as reported by `/stats`, `info` and the
//! monitor's hit-rate figure.

use serde::Serialize;

// == Cache Stats ==
#[derive(Debug, Clone, Default, Serialize)]
pub struct CacheStats {
    /// Lookups that returned a live value
    pub hits: u64,
    /// Lookups that found nothing (absent or expired)
    pub misses: u64,
    /// Entries removed because their TTL elapsed, lazily or by the sweep
    pub expirations: u64,
    pub total_entries: usize,
}

impl CacheStats {
    /// Counts one `get`-style lookup.
    pub fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn lookups(&self) -> u64 {
        self.hits + self.misses
    }

    /// hits / lookups, or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        self.hit_rate_or(0.0)
    }

    /// hits / lookups, or `idle` before the first lookup.
    pub fn hit_rate_or(&self, idle: f64) -> f64 {
        match self.lookups() {
            0 => idle,
            total => self.hits as f64 / total as f64,
        }
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }

    pub fn set_total_entries(&mut self, count: usize) {
        self.total_entries = count;
    }
}
