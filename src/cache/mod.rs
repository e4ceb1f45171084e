//! Cache Module
//!
//! In-process TTL cache: storage, key namespaces, pattern invalidation and
//! the client command surface.

mod client;
mod entry;
mod invalidation;
pub mod keys;
mod pattern;
mod stats;
mod store;


// Re-export public types
pub use client::{get_json, memoize, set_json, CacheClient, InProcessCache, Memoized};
pub use entry::CacheEntry;
pub use invalidation::Invalidator;
pub use keys::TtlTier;
pub use pattern::KeyPattern;
pub use stats::CacheStats;
pub use store::{CacheStore, SharedStore};

// == Public Constants ==
/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 512;

/// Maximum allowed serialized value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB
